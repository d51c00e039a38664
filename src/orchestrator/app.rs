//! 应用入口 - 编排层
//!
//! 负责一次完整运行：加载题目 → 批量解题 → 写出答案 → 校验 → （可选）开发集评估

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::BatchAborted;
use crate::models::load_questions;
use crate::orchestrator::batch_processor::{BatchProcessor, BatchReport};
use crate::services::{answer_writer, evaluator, Strategy};
use crate::utils::logging;
use crate::workflow::StrategyMode;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 测试集默认路径
pub const DEFAULT_INPUT_PATH: &str = "json/cse_476_final_project_test_data.json";
/// 开发集默认路径
pub const DEFAULT_DEV_PATH: &str = "json/cse476_final_project_dev_data.json";
/// 答案默认输出路径
pub const DEFAULT_OUTPUT_PATH: &str = "json/cse_476_final_project_answers.json";
/// CSV 默认输出路径
pub const DEFAULT_CSV_PATH: &str = "answers.csv";

/// 评估时最多展示的不匹配条数
const MISMATCH_SAMPLES: usize = 20;

/// 单次运行的输入输出选项
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output_json: PathBuf,
    pub output_csv: Option<PathBuf>,
    /// 只处理前 N 道题
    pub limit: Option<usize>,
    /// 强制使用的策略（覆盖自适应选择）
    pub strategy: Option<Strategy>,
    /// 与题目中的参考答案比对
    pub evaluate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
            output_json: PathBuf::from(DEFAULT_OUTPUT_PATH),
            output_csv: Some(PathBuf::from(DEFAULT_CSV_PATH)),
            limit: None,
            strategy: None,
            evaluate: false,
        }
    }
}

/// 应用主结构
pub struct App {
    options: RunOptions,
    processor: BatchProcessor<LlmClient>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, options: RunOptions) -> Result<Self> {
        config.validate()?;
        logging::log_startup(&config);

        let client = Arc::new(LlmClient::new(&config));
        let mode = StrategyMode::resolve(config.use_adaptive, options.strategy);
        let processor = BatchProcessor::new(client, &config).with_mode(mode);

        Ok(Self { options, processor })
    }

    /// 运行应用主逻辑，`cancel` 只作用于本次运行
    ///
    /// 预检失败或预检期间被取消时返回 `Ok(None)`，不写任何文件
    pub async fn run(&self, cancel: CancellationToken) -> Result<Option<BatchReport>> {
        info!("\n📁 正在加载题目: {}", self.options.input.display());
        let questions = load_questions(&self.options.input, self.options.limit).await?;

        if questions.is_empty() {
            warn!("⚠️ 没有找到待处理的题目");
        }

        let reference = self.options.evaluate.then(|| questions.clone());

        let report = match self.processor.run_until_cancelled(questions, cancel).await {
            Ok(report) => report,
            Err(aborted @ BatchAborted::SmokeTestFailed { .. }) => {
                error!("🛑 {}", aborted);
                warn!("⚠️ 未写入任何答案文件");
                return Ok(None);
            }
            Err(BatchAborted::Cancelled) => {
                warn!("🛑 运行已取消，未写入任何答案文件");
                return Ok(None);
            }
        };

        answer_writer::write_json(&self.options.output_json, &report.records).await?;
        if let Some(csv_path) = &self.options.output_csv {
            answer_writer::write_csv(csv_path, &report.records).await?;
        }

        let validated = answer_writer::validate_answer_file(&self.options.output_json).await?;
        info!("✓ 校验通过 {} 条答案", validated);

        if let Some(questions) = reference {
            let evaluation = evaluator::evaluate(&questions, &report.records);
            evaluator::log_report(&evaluation, MISMATCH_SAMPLES);
        }

        if let Some(limit) = self.options.limit {
            info!("💡 本次只处理了前 {} 道题", limit);
        }

        Ok(Some(report))
    }
}
