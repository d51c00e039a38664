pub mod question_ctx;
pub mod solve_flow;

pub use question_ctx::QuestionCtx;
pub use solve_flow::{SolveFlow, StrategyMode};
