//! # 系列分类配置服务
//!
//! 负责 `series.yaml` 的加载与写回。分类的纯内存操作（增删改查、快捷输入解析）
//! 定义在 `models::series::SeriesCatalog` 上。
//!
//! 分类配置不属于表格数据，写回时只做原子写入，不创建备份。

use std::path::Path;

use crate::error::AppResult;
use crate::models::series::SeriesCatalog;
use crate::services::file_guard;
use crate::services::state::AppState;

/// 读取分类配置；文件不存在时写入内置分类并返回
pub async fn load_or_init(path: &Path) -> AppResult<SeriesCatalog> {
    if !path.exists() {
        let catalog = SeriesCatalog::default();
        save_catalog(path, &catalog).await?;
        log::info!("已创建默认系列配置: {}", path.display());
        return Ok(catalog);
    }

    let content = tokio::fs::read_to_string(path).await?;
    let catalog: SeriesCatalog = serde_yaml::from_str(&content)?;
    let (main_count, sub_count) = catalog.counts();
    log::debug!(
        "已加载系列配置 {}: {} 个主系列，{} 个子系列",
        path.display(),
        main_count,
        sub_count
    );
    Ok(catalog)
}

pub async fn save_catalog(path: &Path, catalog: &SeriesCatalog) -> AppResult<()> {
    let content = serde_yaml::to_string(catalog)?;
    file_guard::atomic_write(path, content.as_bytes()).await
}

/// 修改分类：在副本上执行 `edit`，写回文件成功后再替换内存中的分类
///
/// `edit` 返回错误时文件和内存都保持不变。
pub async fn edit_catalog<F>(state: &AppState, edit: F) -> AppResult<SeriesCatalog>
where
    F: FnOnce(&mut SeriesCatalog) -> AppResult<()>,
{
    let path = state.config().series_path();
    let lock = state.file_lock(&path);
    let _guard = lock.lock().await;

    let mut catalog = state.catalog();
    edit(&mut catalog)?;
    save_catalog(&path, &catalog).await?;
    state.set_catalog(catalog.clone());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::AppConfig;

    #[tokio::test]
    async fn edits_persist_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();

        edit_catalog(&state, |c| c.add_subseries("Mainlines", "Treasure Hunts"))
            .await
            .unwrap();
        assert!(state.catalog().is_valid_combination("Mainlines", "Treasure Hunts"));

        let reloaded = load_or_init(&state.config().series_path()).await.unwrap();
        assert_eq!(reloaded, state.catalog());
        // YAML 保持主系列顺序
        assert_eq!(
            reloaded.main_series_names(),
            vec!["Mainlines", "Silver Series", "Premiums", "Others"]
        );
    }

    #[tokio::test]
    async fn failed_edit_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();
        let before = std::fs::read_to_string(state.config().series_path()).unwrap();

        assert!(
            edit_catalog(&state, |c| c.remove_subseries("Mainlines", "Nope"))
                .await
                .is_err()
        );
        assert_eq!(state.catalog(), SeriesCatalog::default());
        assert_eq!(
            std::fs::read_to_string(state.config().series_path()).unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.yaml");
        std::fs::write(&path, "series: [ {name: ").unwrap();
        assert!(load_or_init(&path).await.is_err());
    }
}
