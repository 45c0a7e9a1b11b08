//! # 备份轮转服务
//!
//! 每次修改表格文件前创建两份副本，存放在专用备份目录中：
//! - `{base}_backup_{timestamp}.{ext}` - 带时间戳的历史副本
//! - `{base}_backup_latest.{ext}` - 最近一次备份的固定别名，每次覆盖
//!
//! ## 保留策略
//! 每个源文件最多保留 `max_backups` 份时间戳副本（latest 不计入）。
//! 按修改时间降序排序，时间相同时按文件名降序（时间戳越新文件名越大），
//! 删除排在 `max_backups` 之后的副本。
//!
//! ## 失败语义
//! - 复制失败 → `AppError::Backup`，调用方必须中止写操作
//! - 清理失败 → 仅记录日志，不影响触发它的写操作

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::utils::path::split_file_name;

/// latest 别名使用的固定后缀
const LATEST_TAG: &str = "latest";

/// 同一时间戳下尝试的备份文件名数量上限
const MAX_NAME_ATTEMPTS: usize = 1000;

/// 备份策略：备份目录 + 保留数量
#[derive(Debug, Clone)]
pub struct BackupPolicy {
    pub dir: PathBuf,
    pub max_backups: usize,
}

/// 一次备份产生的两份副本路径
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub backup_path: PathBuf,
    pub latest_path: PathBuf,
}

/// 某个源文件的清理结果（供 cleanup 命令展示）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub base_name: String,
    pub deleted: Vec<String>,
}

/// 为源文件创建时间戳备份和 latest 备份，然后清理超出保留数量的旧备份
///
/// # 错误
/// 备份目录创建失败或任一副本复制失败时返回 `AppError::Backup`
pub async fn create_backup(source: &Path, policy: &BackupPolicy) -> AppResult<BackupOutcome> {
    if !policy.dir.exists() {
        tokio::fs::create_dir_all(&policy.dir)
            .await
            .map_err(|e| AppError::Backup(format!("创建备份目录失败: {}", e)))?;
    }

    let (base, ext) = split_file_name(source);
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
    let backup_path = reserve_backup_path(&policy.dir, &base, &timestamp, &ext).await?;
    let latest_path = policy.dir.join(backup_file_name(&base, LATEST_TAG, &ext));

    if let Err(e) = tokio::fs::copy(source, &backup_path).await {
        let _ = tokio::fs::remove_file(&backup_path).await;
        return Err(AppError::Backup(format!(
            "创建备份 {} 失败: {}",
            backup_path.display(),
            e
        )));
    }
    tokio::fs::copy(source, &latest_path)
        .await
        .map_err(|e| AppError::Backup(format!("更新 latest 备份失败: {}", e)))?;

    log::info!("已创建备份: {}", backup_path.display());

    if let Err(e) = prune_backups(&policy.dir, &base, &ext, policy.max_backups).await {
        log::warn!("清理 {} 的旧备份失败: {}", base, e);
    }

    Ok(BackupOutcome {
        backup_path,
        latest_path,
    })
}

/// 以 `create_new` 占用一个尚不存在的时间戳备份文件名
///
/// 同一毫秒内的多次备份依次追加 `_1`、`_2` 等后缀，已有的备份文件永远不会被覆盖。
async fn reserve_backup_path(dir: &Path, base: &str, timestamp: &str, ext: &str) -> AppResult<PathBuf> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let tag = if attempt == 0 {
            timestamp.to_string()
        } else {
            format!("{}_{}", timestamp, attempt)
        };
        let path = dir.join(backup_file_name(base, &tag, ext));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(AppError::Backup(format!(
                    "创建备份 {} 失败: {}",
                    path.display(),
                    e
                )));
            }
        }
    }
    Err(AppError::Backup(format!(
        "时间戳 {} 的备份文件名已全部被占用",
        timestamp
    )))
}

/// 删除超出保留数量的时间戳备份
///
/// # 返回值
/// 被删除的备份文件路径列表
pub async fn prune_backups(
    dir: &Path,
    base: &str,
    ext: &str,
    max_backups: usize,
) -> AppResult<Vec<PathBuf>> {
    let mut backups = list_timestamped(dir, base, ext).await?;
    if backups.len() <= max_backups {
        return Ok(vec![]);
    }

    // 最新的排在前面；修改时间相同时按文件名降序
    backups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut deleted = Vec::new();
    for (path, _) in backups.into_iter().skip(max_backups) {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("已删除旧备份: {}", path.display());
                deleted.push(path);
            }
            Err(e) => log::warn!("无法删除旧备份 {}: {}", path.display(), e),
        }
    }
    Ok(deleted)
}

/// 源文件对应的 latest 备份路径
///
/// # 错误
/// latest 备份不存在 → `NotFound`
pub fn latest_backup_path(source: &Path, policy: &BackupPolicy) -> AppResult<PathBuf> {
    let (base, ext) = split_file_name(source);
    let latest_path = policy.dir.join(backup_file_name(&base, LATEST_TAG, &ext));
    if !latest_path.exists() {
        return Err(AppError::not_found(format!(
            "没有可用于恢复的备份: {}",
            latest_path.display()
        )));
    }
    Ok(latest_path)
}

/// 清理备份目录中所有源文件的旧备份
///
/// 通过 `_backup_` 分隔符识别出目录中出现过的所有（基础名，扩展名）组合，逐一清理。
pub async fn cleanup_all(dir: &Path, max_backups: usize) -> AppResult<Vec<PruneReport>> {
    if !dir.exists() {
        return Err(AppError::not_found(format!("备份目录不存在: {}", dir.display())));
    }

    let mut groups: Vec<(String, String)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(split) = name.find("_backup_") else {
            continue;
        };
        let base = name[..split].to_string();
        let (_, ext) = split_file_name(&path);
        if !groups.contains(&(base.clone(), ext.clone())) {
            groups.push((base, ext));
        }
    }
    groups.sort();

    let mut reports = Vec::with_capacity(groups.len());
    for (base, ext) in groups {
        let deleted = prune_backups(dir, &base, &ext, max_backups).await?;
        reports.push(PruneReport {
            base_name: base,
            deleted: deleted
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect(),
        });
    }
    Ok(reports)
}

/// 拼接备份文件名：`{base}_backup_{tag}.{ext}`（无扩展名时省略点号）
fn backup_file_name(base: &str, tag: &str, ext: &str) -> String {
    if ext.is_empty() {
        format!("{}_backup_{}", base, tag)
    } else {
        format!("{}_backup_{}.{}", base, tag, ext)
    }
}

/// 列出某个源文件的全部时间戳备份（不含 latest）及其修改时间
async fn list_timestamped(dir: &Path, base: &str, ext: &str) -> AppResult<Vec<(PathBuf, SystemTime)>> {
    let prefix = format!("{}_backup_", base);
    let suffix = if ext.is_empty() {
        String::new()
    } else {
        format!(".{}", ext)
    };
    let latest = backup_file_name(base, LATEST_TAG, ext);

    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name == latest || !name.starts_with(&prefix) || !name.ends_with(&suffix) {
            continue;
        }
        // 时间戳部分不能为空
        if name.len() <= prefix.len() + suffix.len() {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((entry.path(), mtime));
    }
    Ok(found)
}
