//! # DieCast Tracker - 命令行入口
//!
//! 初始化日志后解析命令行参数，核心逻辑位于 `diecast_lib::run()`。

use clap::Parser;

use diecast_lib::cli::Cli;

/// 日志级别默认为 info，可通过 `RUST_LOG` 覆盖
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = diecast_lib::run(cli).await {
        eprintln!("错误: {}", e);
        std::process::exit(1);
    }
}
