//! # 应用配置数据模型
//!
//! 定义 `AppConfig`：所有文件路径、备份保留数量和 HTTP 监听地址。
//! 配置对象在启动时加载一次，之后通过 `AppState` 显式传递，不存在进程级全局配置。
//!
//! 配置文件路径：`<系统配置目录>/diecast-tracker/config.json`
//!
//! ```json
//! {
//!   "dataDir": "/home/user/.local/share/diecast-tracker",
//!   "collectionFile": "HW_list.jsonl",
//!   "preordersFile": "preorders.jsonl",
//!   "seriesFile": "series.yaml",
//!   "backupDir": null,
//!   "maxBackups": 5,
//!   "bindAddr": "127.0.0.1:8000"
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::path;

/// 默认保留的时间戳备份数量（不含 latest 副本）
pub const DEFAULT_MAX_BACKUPS: usize = 5;

/// 应用配置
///
/// 所有字段均有默认值，配置文件中缺失的字段自动使用默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// 数据目录：收藏清单、预订清单和系列配置默认都存放在这里
    pub data_dir: PathBuf,

    /// 收藏清单文件名（相对于 `data_dir`）
    pub collection_file: String,

    /// 预订清单文件名（相对于 `data_dir`）
    pub preorders_file: String,

    /// 系列分类配置文件名（相对于 `data_dir`）
    pub series_file: String,

    /// 备份目录：为 `None` 时使用 `<data_dir>/backups`
    pub backup_dir: Option<PathBuf>,

    /// 每个源文件保留的时间戳备份数量
    pub max_backups: usize,

    /// HTTP 服务监听地址
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: path::default_data_dir(),
            collection_file: "HW_list.jsonl".to_string(),
            preorders_file: "preorders.jsonl".to_string(),
            series_file: "series.yaml".to_string(),
            backup_dir: None,
            max_backups: DEFAULT_MAX_BACKUPS,
            bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

/// 可恢复、可导出的数据表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// 收藏清单
    Collection,
    /// 预订清单
    Preorders,
}

impl TableKind {
    pub fn path(self, config: &AppConfig) -> PathBuf {
        match self {
            TableKind::Collection => config.collection_path(),
            TableKind::Preorders => config.preorders_path(),
        }
    }
}

impl AppConfig {
    /// 以指定数据目录构造配置，其余字段取默认值
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn collection_path(&self) -> PathBuf {
        self.data_dir.join(&self.collection_file)
    }

    pub fn preorders_path(&self) -> PathBuf {
        self.data_dir.join(&self.preorders_file)
    }

    pub fn series_path(&self) -> PathBuf {
        self.data_dir.join(&self.series_file)
    }

    pub fn backup_dir_path(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "dataDir": "/tmp/hw", "maxBackups": 3 }"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hw"));
        assert_eq!(config.max_backups, 3);
        assert_eq!(config.collection_file, "HW_list.jsonl");
        assert_eq!(config.backup_dir_path(), PathBuf::from("/tmp/hw").join("backups"));
    }

    #[test]
    fn table_kind_from_json() {
        let kind: TableKind = serde_json::from_str("\"preorders\"").unwrap();
        let config = AppConfig::with_data_dir("/data");
        assert_eq!(kind.path(&config), PathBuf::from("/data/preorders.jsonl"));
        assert!(serde_json::from_str::<TableKind>("\"series\"").is_err());
    }

    #[test]
    fn explicit_backup_dir_wins() {
        let mut config = AppConfig::with_data_dir("/data");
        config.backup_dir = Some(PathBuf::from("/elsewhere"));
        assert_eq!(config.backup_dir_path(), PathBuf::from("/elsewhere"));
        assert_eq!(config.preorders_path(), PathBuf::from("/data/preorders.jsonl"));
    }
}
