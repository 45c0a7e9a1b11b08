//! # DieCast Tracker - 核心库
//!
//! Hot Wheels 收藏清单管理：以 JSON Lines 表格存储收藏和预订记录，
//! 每次修改前自动备份，通过交互菜单或本地 HTTP JSON API 操作。
//!
//! ## 模块结构
//! - `commands/` - JSON command 处理函数（HTTP 接口层）
//! - `models/` - 数据模型（表格、系列分类、统计结果、配置）
//! - `services/` - 核心业务逻辑（存储、备份、统计、搜索、导出）
//! - `utils/` - 通用工具函数
//! - `server` - HTTP 路由与监听循环
//! - `menu` - 交互式文本菜单
//! - `cli` - 命令行参数

pub mod cli;
pub mod commands;
pub mod error;
pub mod menu;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

use std::sync::Arc;

use cli::{Cli, Command};
use error::AppResult;
use services::state::AppState;

/// 按命令行参数执行一个子命令
///
/// 启动流程：读取配置文件 → 应用命令行覆盖 → 加载应用状态（创建数据目录、读取系列分类）→ 分发子命令。
pub async fn run(cli: Cli) -> AppResult<()> {
    let config_path = cli.config_path()?;
    let mut config = services::config::load_config(&config_path).await;
    cli.apply_overrides(&mut config);
    log::debug!("配置文件: {}，数据目录: {}", config_path.display(), config.data_dir.display());

    if cli.command() == Command::InitConfig {
        services::config::save_config(&config_path, &config).await?;
        println!("已写入配置文件: {}", config_path.display());
        return Ok(());
    }

    let state = AppState::load(config).await?;

    match cli.command() {
        Command::Menu | Command::InitConfig => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            menu::Menu::new(&state, input, tokio::io::stdout()).run().await
        }
        Command::Serve => server::serve(Arc::new(state)).await,
        Command::ConvertYears => {
            let changes = services::year_format::convert_model_names(&state).await?;
            if changes.is_empty() {
                println!("所有年份格式均已规范，无需修改");
            }
            for change in &changes {
                println!("#{}: {} -> {}", change.serial_number, change.original, change.converted);
            }
            Ok(())
        }
        Command::CleanupBackups => {
            let policy = state.backup_policy();
            let reports = services::backup::cleanup_all(&policy.dir, policy.max_backups).await?;
            let deleted: usize = reports.iter().map(|r| r.deleted.len()).sum();
            println!("已清理 {} 份旧备份（{} 个源文件）", deleted, reports.len());
            Ok(())
        }
        Command::Restore { table } => {
            let body = commands::tools::restore_backup(&state, commands::tools::RestoreRequest { table }).await?;
            if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
                println!("{}", message);
            }
            Ok(())
        }
    }
}
