/// 日志工具模块
///
/// 提供批次日志格式化和输出的辅助函数
use crate::config::Config;
use crate::orchestrator::BatchReport;
use crate::workflow::StrategyMode;
use tracing::{info, warn};

/// 汇总中展示的错误样例数
pub const ERROR_SAMPLES: usize = 5;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 生效的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发批量解题模式");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 模型端点: {} ({})", config.llm_api_base_url, config.llm_model_name);
    info!("📊 最大并发数: {}", config.max_workers);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 题目总数
/// - `worker_limit`: 最大并发数
/// - `mode`: 策略模式
pub fn log_batch_start(total: usize, worker_limit: usize, mode: StrategyMode) {
    let mode_desc = match mode {
        StrategyMode::Adaptive => "自适应".to_string(),
        StrategyMode::Fixed(strategy) => format!("固定策略 {}", strategy),
    };
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理 {} 道题目", total);
    info!("📋 并发上限: {} | 策略: {}", worker_limit, mode_desc);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 批次结果
pub fn print_final_stats(report: &BatchReport) {
    let total = report.records.len();
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("⏱️ 耗时: {:.1}s", report.elapsed.as_secs_f64());
    info!("📞 模型调用: {}", report.call_count);
    info!("✅ 成功: {}/{}", total.saturating_sub(report.errors.len()), total);
    info!("❌ 错误: {}", report.error_count);
    for sample in report.errors.iter().take(ERROR_SAMPLES) {
        warn!("   {}", sample);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
