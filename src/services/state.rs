//! # 应用共享状态
//!
//! `AppState` 在启动时构建一次，以 `Arc<AppState>` 的形式在 HTTP 服务和交互菜单之间共享：
//! - **配置**：只读的 `AppConfig`
//! - **系列分类**：内存中的 `SeriesCatalog`，修改时同步写回 `series.yaml`
//! - **文件锁**：每个数据文件一把异步互斥锁，串行化同一文件的"读取-修改-写入"
//! - **备份注册表**：本次运行期间创建的备份记录
//!
//! ## 线程安全
//! 分类和注册表使用 `std::sync::RwLock`，读多写少且临界区内没有 `.await`。
//! 文件锁使用 `tokio::sync::Mutex`，因为持锁期间需要执行异步文件 I/O。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::AppResult;
use crate::models::series::SeriesCatalog;
use crate::models::settings::AppConfig;
use crate::services::backup::BackupPolicy;
use crate::services::file_guard::BackupEntry;
use crate::services::series;

/// 备份注册表最多保留的记录数
const BACKUP_REGISTRY_MAX_ENTRIES: usize = 100;

pub struct AppState {
    config: AppConfig,

    /// 系列分类（`series.yaml` 的内存副本）
    catalog: RwLock<SeriesCatalog>,

    /// 文件路径 → 该文件的异步互斥锁
    file_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,

    /// 本次运行创建的备份（按时间顺序）
    backups: RwLock<Vec<BackupEntry>>,
}

impl AppState {
    /// 以给定的配置和分类构造状态，不做任何文件 I/O
    pub fn new(config: AppConfig, catalog: SeriesCatalog) -> Self {
        Self {
            config,
            catalog: RwLock::new(catalog),
            file_locks: Mutex::new(HashMap::new()),
            backups: RwLock::new(Vec::new()),
        }
    }

    /// 确保数据目录存在并加载系列分类（不存在时写入内置分类）
    pub async fn load(config: AppConfig) -> AppResult<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;
        let catalog = series::load_or_init(&config.series_path()).await?;
        Ok(Self::new(config, catalog))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        BackupPolicy {
            dir: self.config.backup_dir_path(),
            max_backups: self.config.max_backups,
        }
    }

    // ======== 系列分类 ========

    /// 当前分类的快照
    pub fn catalog(&self) -> SeriesCatalog {
        match self.catalog.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 替换内存中的分类（调用方负责先写回文件）
    pub fn set_catalog(&self, catalog: SeriesCatalog) {
        match self.catalog.write() {
            Ok(mut guard) => *guard = catalog,
            Err(poisoned) => *poisoned.into_inner() = catalog,
        }
    }

    // ======== 文件锁 ========

    /// 获取指定文件的互斥锁
    ///
    /// 同一路径总是返回同一把锁。调用方在整个"读取-修改-写入"期间持有 guard。
    pub fn file_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.file_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    // ======== 备份注册表 ========

    pub fn register_backup(&self, entry: BackupEntry) {
        let mut backups = match self.backups.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if backups.len() >= BACKUP_REGISTRY_MAX_ENTRIES {
            backups.remove(0);
        }
        backups.push(entry);
    }

    /// 已登记的备份，最新的在前
    pub fn backups(&self) -> Vec<BackupEntry> {
        let backups = match self.backups.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        backups.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: &str) -> BackupEntry {
        BackupEntry {
            original_path: "a".into(),
            backup_path: "b".into(),
            created_at: "now".into(),
            operation: op.into(),
        }
    }

    #[test]
    fn same_path_shares_one_lock() {
        let state = AppState::new(AppConfig::with_data_dir("/tmp/x"), SeriesCatalog::default());
        let a = state.file_lock(Path::new("/tmp/x/HW_list.jsonl"));
        let b = state.file_lock(Path::new("/tmp/x/HW_list.jsonl"));
        let c = state.file_lock(Path::new("/tmp/x/preorders.jsonl"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn registry_is_bounded_and_newest_first() {
        let state = AppState::new(AppConfig::with_data_dir("/tmp/x"), SeriesCatalog::default());
        for i in 0..(BACKUP_REGISTRY_MAX_ENTRIES + 3) {
            state.register_backup(entry(&i.to_string()));
        }
        let backups = state.backups();
        assert_eq!(backups.len(), BACKUP_REGISTRY_MAX_ENTRIES);
        assert_eq!(backups[0].operation, (BACKUP_REGISTRY_MAX_ENTRIES + 2).to_string());
    }

    #[test]
    fn registry_survives_poisoned_lock() {
        let state = AppState::new(AppConfig::with_data_dir("/tmp/x"), SeriesCatalog::default());
        state.register_backup(entry("before"));

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = state.backups.write().unwrap();
                panic!("panic while holding the registry lock");
            });
            assert!(handle.join().is_err());
        });
        assert!(state.backups.is_poisoned());

        state.register_backup(entry("after"));
        let backups = state.backups();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].operation, "after");
        assert_eq!(backups[1].operation, "before");
    }

    #[tokio::test]
    async fn load_creates_data_dir_and_default_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("nested");
        let state = AppState::load(AppConfig::with_data_dir(&data)).await.unwrap();
        assert!(data.join("series.yaml").exists());
        assert_eq!(state.catalog(), SeriesCatalog::default());
    }
}
