//! # 路径工具函数
//!
//! 提供与文件路径相关的工具函数，包括：
//! - 获取默认数据目录（`<系统数据目录>/diecast-tracker/`）
//! - 获取默认配置文件路径（`<系统配置目录>/diecast-tracker/config.json`）
//! - 验证写入目标位于数据目录内
//! - 拆分文件名为基础名和扩展名（用于备份命名）

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// 应用目录名
const APP_DIR_NAME: &str = "diecast-tracker";

/// 获取默认数据目录
///
/// 使用 `dirs` crate 获取跨平台的用户数据目录：
/// - Windows: `C:\Users\username\AppData\Roaming\diecast-tracker`
/// - Linux: `/home/username/.local/share/diecast-tracker`
/// - macOS: `/Users/username/Library/Application Support/diecast-tracker`
///
/// 无法确定系统数据目录时退回到当前目录下的 `data/`。
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// 获取默认配置文件路径
///
/// # 错误
/// 无法确定系统配置目录（如无 HOME 环境变量）时返回错误
pub fn default_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| AppError::not_found("无法获取系统配置目录"))?;
    Ok(config_dir.join(APP_DIR_NAME).join("config.json"))
}

/// 验证目标路径位于指定根目录下
///
/// 使用 `canonicalize` 解析符号链接和 `..` 等路径组件，防止路径遍历。
/// 目标文件尚不存在时（如首次添加记录），改为解析其父目录。
///
/// # 错误
/// 路径解析失败或路径不在根目录下时返回 `Validation`
pub fn ensure_within(target: &Path, root: &Path) -> AppResult<()> {
    let root_canonical = std::fs::canonicalize(root)
        .map_err(|e| AppError::validation(format!("数据目录解析失败: {}", e)))?;

    let canonical = if target.exists() {
        std::fs::canonicalize(target)
    } else {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::canonicalize(parent)
    }
    .map_err(|e| AppError::validation(format!("路径解析失败: {}", e)))?;

    if !canonical.starts_with(&root_canonical) {
        return Err(AppError::validation(format!(
            "安全检查失败：路径 {} 不在数据目录 {} 下",
            target.display(),
            root.display()
        )));
    }
    Ok(())
}

/// 将文件路径拆分为（基础名，扩展名）
///
/// # 示例
/// - `data/HW_list.jsonl` → `("HW_list", "jsonl")`
/// - `data/notes` → `("notes", "")`
pub fn split_file_name(path: &Path) -> (String, String) {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    (base, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            split_file_name(Path::new("data/HW_list.jsonl")),
            ("HW_list".to_string(), "jsonl".to_string())
        );
        assert_eq!(
            split_file_name(Path::new("notes")),
            ("notes".to_string(), String::new())
        );
    }

    #[test]
    fn test_ensure_within() {
        let dir = tempfile::tempdir().unwrap();
        let inside = dir.path().join("HW_list.jsonl");
        assert!(ensure_within(&inside, dir.path()).is_ok());

        let other = tempfile::tempdir().unwrap();
        let outside = other.path().join("HW_list.jsonl");
        assert!(ensure_within(&outside, dir.path()).is_err());

        let escape = dir.path().join("..").join("x.jsonl");
        assert!(ensure_within(&escape, dir.path()).is_err());
    }
}
