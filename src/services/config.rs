//! # 配置文件读写服务
//!
//! 配置文件路径默认为 `<系统配置目录>/diecast-tracker/config.json`，可通过 `--config` 覆盖。
//! 读取失败从不阻止启动：文件不存在或内容无法解析时使用默认配置并记录警告。

use std::path::Path;

use crate::error::AppResult;
use crate::models::settings::AppConfig;
use crate::services::file_guard;

/// 读取配置文件
///
/// 文件不存在时返回默认配置；读取或解析失败时记录警告并返回默认配置。
pub async fn load_config(config_path: &Path) -> AppConfig {
    if !config_path.exists() {
        log::debug!("配置文件不存在，使用默认配置: {}", config_path.display());
        return AppConfig::default();
    }

    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(e) => {
            log::warn!("读取配置文件 {} 失败，使用默认配置: {}", config_path.display(), e);
            return AppConfig::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("解析配置文件 {} 失败，使用默认配置: {}", config_path.display(), e);
            AppConfig::default()
        }
    }
}

/// 保存配置文件（带缩进格式化），目录不存在时自动创建
pub async fn save_config(config_path: &Path, config: &AppConfig) -> AppResult<()> {
    let content = serde_json::to_string_pretty(config)?;
    file_guard::atomic_write(config_path, content.as_bytes()).await
}
