pub mod chat_model;
pub mod llm_client;

pub use chat_model::{ChatModel, ModelCallResult};
pub use llm_client::LlmClient;
