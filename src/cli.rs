//! # 命令行参数
//!
//! 全局参数可以覆盖配置文件中的对应字段；子命令省略时进入交互菜单。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::AppResult;
use crate::models::settings::{AppConfig, TableKind};
use crate::utils::path;

#[derive(Parser, Debug)]
#[command(name = "diecast-tracker", version, about = "Hot Wheels 收藏清单管理")]
pub struct Cli {
    /// 配置文件路径（默认 `<系统配置目录>/diecast-tracker/config.json`）
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 覆盖数据目录
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖每个文件保留的时间戳备份数量
    #[arg(long, global = true, value_name = "N")]
    pub max_backups: Option<usize>,

    /// 覆盖 HTTP 服务监听地址
    #[arg(long, global = true, value_name = "ADDR")]
    pub bind: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 交互式菜单（默认）
    Menu,
    /// 启动 HTTP JSON API
    Serve,
    /// 将车型名称中的年份统一为 'YY 写法
    ConvertYears,
    /// 清理备份目录中超出保留数量的旧备份
    CleanupBackups,
    /// 用 latest 备份恢复指定表格
    Restore {
        #[arg(value_enum)]
        table: TableKind,
    },
    /// 把当前生效的配置写入配置文件
    InitConfig,
}

impl Cli {
    /// 子命令，省略时为交互菜单
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }

    pub fn config_path(&self) -> AppResult<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => path::default_config_path(),
        }
    }

    /// 用命令行参数覆盖配置文件中的值
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(max) = self.max_backups {
            config.max_backups = max;
        }
        if let Some(bind) = &self.bind {
            config.bind_addr = bind.clone();
        }
    }
}
