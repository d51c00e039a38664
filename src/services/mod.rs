pub mod answer_extractor;
pub mod answer_writer;
pub mod evaluator;
pub mod strategy;
pub mod strategy_selector;

pub use answer_extractor::{extract, extract_reasoning};
pub use evaluator::{evaluate, EvaluationReport};
pub use strategy::{majority_vote, Strategy};
pub use strategy_selector::select;
