//! 日志初始化
//!
//! `RUST_LOG` 优先；未设置时按命令行的详细级别决定

use tracing_subscriber::EnvFilter;

/// 按详细级别初始化：0 = info, 1 = debug, 2+ = trace
pub fn init_with_verbosity(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
