pub mod loaders;
pub mod question;
pub mod run_stats;

pub use loaders::load_questions;
pub use question::{AnswerRecord, Question, SolveOutcome, TaskError, UNKNOWN_DOMAIN};
pub use run_stats::RunStatistics;
