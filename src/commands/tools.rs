//! # 维护工具 Commands
//!
//! - `list_backups` - 本次运行期间创建的备份
//! - `restore_backup` - 用 latest 备份恢复收藏清单或预订清单
//! - `cleanup_backups` - 清理备份目录中所有源文件的旧备份
//! - `convert_years` - 规范化车型名称中的年份写法

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, AppResult};
use crate::models::settings::TableKind;
use crate::services::state::AppState;
use crate::services::{backup, file_guard, year_format};

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub table: TableKind,
}

/// 获取本次运行期间的备份记录，最新的在前
pub async fn list_backups(state: &AppState) -> AppResult<Value> {
    let backups = state.backups();
    Ok(json!({
        "success": true,
        "total": backups.len(),
        "backups": backups,
        "backup_dir": state.config().backup_dir_path(),
    }))
}

/// 用 latest 备份覆盖指定表格
///
/// 与其他写操作共用文件锁和受保护写入路径：先读出 latest 内容，
/// 再为当前文件创建并登记备份，最后原子写入，恢复本身也可以撤销。
pub async fn restore_backup(state: &AppState, req: RestoreRequest) -> AppResult<Value> {
    let source = req.table.path(state.config());
    let lock = state.file_lock(&source);
    let _guard = lock.lock().await;

    let restored_from = backup::latest_backup_path(&source, &state.backup_policy())?;
    let content = tokio::fs::read(&restored_from)
        .await
        .map_err(|e| AppError::Backup(format!("读取备份 {} 失败: {}", restored_from.display(), e)))?;

    file_guard::backup_before_write(&source, "restore", state).await?;
    file_guard::atomic_write(&source, &content).await?;
    log::info!("已从 {} 恢复 {}", restored_from.display(), source.display());

    Ok(json!({
        "success": true,
        "message": format!("已从 {} 恢复", restored_from.display()),
    }))
}

pub async fn cleanup_backups(state: &AppState) -> AppResult<Value> {
    let policy = state.backup_policy();
    let reports = backup::cleanup_all(&policy.dir, policy.max_backups).await?;
    let deleted: usize = reports.iter().map(|r| r.deleted.len()).sum();
    Ok(json!({
        "success": true,
        "message": format!("已清理 {} 份旧备份", deleted),
        "reports": reports,
    }))
}

pub async fn convert_years(state: &AppState) -> AppResult<Value> {
    let changes = year_format::convert_model_names(state).await?;
    let message = if changes.is_empty() {
        "所有年份格式均已规范，无需修改".to_string()
    } else {
        format!("已更新 {} 个车型名称", changes.len())
    };
    Ok(json!({
        "success": true,
        "message": message,
        "changes": changes,
    }))
}
