//! # 文件写入守卫服务
//!
//! 统一所有对数据文件的修改操作，保证"先备份，后写入"：
//!
//! ## 备份（强制）
//! 目标文件已存在时，写入前调用 `backup::create_backup` 生成时间戳副本和 latest 副本。
//! 备份失败则整个写操作中止，原文件保持不变。
//! 成功的备份登记到 `AppState` 的备份注册表中，供 `/api/backups` 展示。
//!
//! ## 路径安全验证
//! 所有写入前验证目标路径位于配置的数据目录下，防止意外修改数据目录之外的文件。
//!
//! ## 原子写入
//! 内容先写入同目录下的 `.tmp` 临时文件，再 `rename` 覆盖目标文件，
//! 写入中途失败不会留下半截文件。
//!
//! ## 使用方式
//! 所有对表格文件的修改必须先调用 `backup_before_write()`，再用 `atomic_write()` 写入。
//! `RecordStore` 在持有文件锁期间依次执行：备份 → 读取 → 修改 → 写入。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::services::backup;
use crate::services::state::AppState;
use crate::utils::path;

/// 备份注册表中的单条记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    /// 被备份的原始文件路径
    pub original_path: String,
    /// 时间戳备份文件路径
    pub backup_path: String,
    /// 备份创建时间（RFC 3339 格式）
    pub created_at: String,
    /// 触发备份的操作（如 "add_model"、"delete_preorder"）
    pub operation: String,
}

/// 写入前的守卫步骤：路径验证 + 备份 + 登记
///
/// 执行流程：
/// 1. 验证路径在数据目录下
/// 2. 如果原文件存在，创建备份（失败即中止）
/// 3. 将备份登记到 `AppState` 的注册表
///
/// 目标文件不存在时不做备份，返回 `None`。
///
/// # 参数
/// - `file_path` - 即将被写入的文件
/// - `operation` - 操作描述（用于备份记录）
/// - `state` - 应用状态，提供备份策略和备份注册表
pub async fn backup_before_write(
    file_path: &Path,
    operation: &str,
    state: &AppState,
) -> AppResult<Option<BackupEntry>> {
    path::ensure_within(file_path, &state.config().data_dir)?;
    if !file_path.exists() {
        return Ok(None);
    }

    let outcome = backup::create_backup(file_path, &state.backup_policy()).await?;
    let entry = BackupEntry {
        original_path: file_path.to_string_lossy().to_string(),
        backup_path: outcome.backup_path.to_string_lossy().to_string(),
        created_at: chrono::Local::now().to_rfc3339(),
        operation: operation.to_string(),
    };
    state.register_backup(entry.clone());
    Ok(Some(entry))
}

/// 原子写入：先写临时文件再重命名
///
/// 父目录不存在时自动创建。不做备份，配置文件等非表格数据直接使用。
pub async fn atomic_write(file_path: &Path, content: &[u8]) -> AppResult<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(file_path);
    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, file_path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// `HW_list.jsonl` → `HW_list.jsonl.tmp`
fn tmp_path(file_path: &Path) -> PathBuf {
    let mut name = file_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    file_path.with_file_name(name)
}
