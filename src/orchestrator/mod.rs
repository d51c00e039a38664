//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 加载配置与题目
//! - 创建客户端和批量处理器
//! - 写出答案文件、校验格式、开发集评估
//!
//! ### `batch_processor` - 批量处理器
//! - 预检第一道题
//! - 控制并发数量（Semaphore）
//! - 按下标收集结果，统计错误
//!
//! ### `progress` - 进度跟踪
//!
//! ## 层次关系
//!
//! ```text
//! app (文件 I/O、配置)
//!     ↓
//! batch_processor (处理 Vec<Question>)
//!     ↓
//! workflow::SolveFlow (处理单个 Question)
//!     ↓
//! services (能力层：strategy / extractor / selector)
//!     ↓
//! clients (基础设施：LlmClient)
//! ```

pub mod app;
pub mod batch_processor;
pub mod progress;

// 重新导出主要类型
pub use app::{App, RunOptions};
pub use batch_processor::{BatchProcessor, BatchReport};
pub use progress::{ProgressSnapshot, ProgressTracker};
