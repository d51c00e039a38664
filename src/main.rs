use anyhow::Result;
use batch_question_solver::orchestrator::app::{DEFAULT_DEV_PATH, DEFAULT_INPUT_PATH};
use batch_question_solver::{logger, App, Config, RunOptions, Strategy};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 并发批量解题
#[derive(Debug, Parser)]
#[command(name = "batch_question_solver", version)]
struct Cli {
    /// 题目 JSON 文件（默认测试集；--dev 时默认开发集）
    #[arg(long)]
    input: Option<PathBuf>,

    /// 答案 JSON 输出路径
    #[arg(long, default_value = batch_question_solver::orchestrator::app::DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// 答案 CSV 输出路径
    #[arg(long, default_value = batch_question_solver::orchestrator::app::DEFAULT_CSV_PATH)]
    csv: PathBuf,

    /// 不写 CSV
    #[arg(long)]
    no_csv: bool,

    /// 最大并发数
    #[arg(long)]
    workers: Option<usize>,

    /// 关闭自适应策略选择（全部使用 direct）
    #[arg(long)]
    no_adaptive: bool,

    /// 强制使用的策略: direct | cot | self_consistency
    #[arg(long)]
    algorithm: Option<Strategy>,

    /// 只处理前 N 道题
    #[arg(long, visible_alias = "test")]
    limit: Option<usize>,

    /// 使用开发集并与参考答案比对
    #[arg(long)]
    dev: bool,

    /// 批次截止时间（秒）
    #[arg(long)]
    batch_timeout: Option<u64>,

    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 日志详细程度（-v debug, -vv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    logger::init_with_verbosity(cli.verbose);

    // 加载配置，命令行参数优先
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.max_workers = workers;
    }
    if cli.no_adaptive {
        config.use_adaptive = false;
    }
    if cli.batch_timeout.is_some() {
        config.batch_timeout_secs = cli.batch_timeout;
    }

    let default_input = if cli.dev { DEFAULT_DEV_PATH } else { DEFAULT_INPUT_PATH };
    let options = RunOptions {
        input: cli.input.unwrap_or_else(|| PathBuf::from(default_input)),
        output_json: cli.output,
        output_csv: (!cli.no_csv).then_some(cli.csv),
        limit: cli.limit,
        strategy: cli.algorithm,
        evaluate: cli.dev,
    };

    let app = App::initialize(config, options)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到中断信号，取消剩余任务...");
            on_ctrl_c.cancel();
        }
    });

    app.run(cancel).await?;

    Ok(())
}
