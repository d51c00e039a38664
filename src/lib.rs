//! # Batch Question Solver
//!
//! 一个并发批量解答自然语言题目的 Rust 应用程序：
//! 对每道题自动选择解题策略，调用远程 LLM 端点，提取并归并答案。
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 只暴露"调用一次模型"的能力
//! - `LlmClient` - OpenAI 兼容端点的 HTTP 客户端，所有失败都归一为 `ModelCallResult`
//! - `ChatModel` - 模型能力抽象，便于替换与测试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题
//! - `answer_extractor` - 从自由文本中提取最终答案
//! - `strategy` - 三种解题策略（直接回答 / 思维链 / 自洽投票）
//! - `strategy_selector` - 按关键词选择策略
//! - `answer_writer` - 写 JSON / CSV 与格式校验
//! - `evaluator` - 开发集准确率评估
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（下标 + ID + 领域）
//! - `SolveFlow` - 流程编排（选策略 → 解题）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理并发、预检、进度与汇总
//! - `orchestrator/app` - 一次完整运行（加载 → 解题 → 写出 → 评估）
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ChatModel, LlmClient, ModelCallResult};
pub use config::Config;
pub use error::{AppError, AppResult, BatchAborted, ModelErrorKind};
pub use models::{AnswerRecord, Question, RunStatistics, SolveOutcome};
pub use orchestrator::{App, BatchProcessor, BatchReport, RunOptions};
pub use services::Strategy;
pub use workflow::{QuestionCtx, SolveFlow, StrategyMode};
