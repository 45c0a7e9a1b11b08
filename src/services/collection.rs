//! # 收藏清单服务
//!
//! 收藏清单（`HW_list.jsonl`）上的业务操作。校验规则在这里集中处理，
//! HTTP 接口和交互菜单共用同一套逻辑：
//! - 新增车型时车型名称不能为空，（主系列，子系列）组合必须存在于分类中
//! - 表格中 `Series` 列存储子系列名称

use crate::error::{AppError, AppResult};
use crate::models::table::{DEFAULT_COLLECTION_HEADER, Record, Table};
use crate::services::state::AppState;
use crate::services::store::RecordStore;

/// 车型名称列的列名
pub const MODEL_NAME_COLUMN: &str = "Model Name";

/// 子系列列的列名
pub const SERIES_COLUMN: &str = "Series";

/// 收藏清单的存储句柄
pub fn store(state: &AppState) -> RecordStore<'_> {
    RecordStore::new(state, state.config().collection_path(), DEFAULT_COLLECTION_HEADER)
}

/// 读取收藏清单；文件尚未创建时返回只有默认表头的空表
pub async fn load_collection(state: &AppState) -> AppResult<Table> {
    store(state).load_or_empty().await
}

/// 新增车型，返回编号
///
/// # 错误
/// - 车型名称为空 → `Validation`
/// - 系列组合不在分类中 → `Validation`
pub async fn add_model(
    state: &AppState,
    model_name: &str,
    main_series: &str,
    subseries: &str,
) -> AppResult<u64> {
    let model_name = model_name.trim();
    if model_name.is_empty() {
        return Err(AppError::validation("车型名称不能为空"));
    }
    let main_series = main_series.trim();
    let subseries = subseries.trim();
    if !state.catalog().is_valid_combination(main_series, subseries) {
        return Err(AppError::validation(format!(
            "无效的系列组合: {} / {}",
            main_series, subseries
        )));
    }

    let id = store(state)
        .mutate("add_model", true, |table| {
            let mut fields = vec![String::new(); table.field_width()];
            set_field(table, &mut fields, MODEL_NAME_COLUMN, 1, model_name);
            set_field(table, &mut fields, SERIES_COLUMN, 2, subseries);
            Ok(table.insert(fields))
        })
        .await?;
    log::info!("已添加车型 #{}: {} ({})", id, model_name, subseries);
    Ok(id)
}

pub async fn update_model(state: &AppState, id: u64, updates: &[(String, String)]) -> AppResult<()> {
    store(state).update_fields(id, updates, "update_model").await
}

pub async fn delete_model(state: &AppState, id: u64) -> AppResult<Record> {
    store(state).delete(id, "delete_model").await
}

/// 新增字段，返回新列位置（从 1 开始）
pub async fn add_field(state: &AppState, field_name: &str) -> AppResult<usize> {
    store(state).add_column(field_name, "add_field").await
}

/// 按列名写入字段；列名不存在时退回到固定位置（表头第 `fallback` 列）
fn set_field(table: &Table, fields: &mut [String], column: &str, fallback: usize, value: &str) {
    let idx = table
        .column_index(column)
        .filter(|&i| i > 0)
        .unwrap_or(fallback);
    if let Some(slot) = fields.get_mut(idx - 1) {
        *slot = value.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::AppConfig;

    async fn setup() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();
        (dir, state)
    }

    #[tokio::test]
    async fn add_model_stores_subseries() {
        let (_dir, state) = setup().await;
        let id = add_model(&state, " Bone Shaker ", "Silver Series", "Ultra Hots")
            .await
            .unwrap();
        assert_eq!(id, 1);

        let table = load_collection(&state).await.unwrap();
        assert_eq!(table.records[0].fields, vec!["Bone Shaker", "Ultra Hots"]);
    }

    #[tokio::test]
    async fn add_model_rejects_bad_input() {
        let (_dir, state) = setup().await;
        assert!(matches!(
            add_model(&state, "  ", "Mainlines", "Mainlines").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            add_model(&state, "Deora", "Premiums", "Mainlines").await,
            Err(AppError::Validation(_))
        ));
        assert!(!state.config().collection_path().exists());
    }

    #[tokio::test]
    async fn add_model_respects_custom_column_order() {
        let (dir, state) = setup().await;
        std::fs::write(
            dir.path().join("HW_list.jsonl"),
            "[\"S.No\",\"Colour\",\"Series\",\"Model Name\"]\n",
        )
        .unwrap();
        add_model(&state, "Deora", "Mainlines", "Mainlines").await.unwrap();
        let table = load_collection(&state).await.unwrap();
        assert_eq!(table.records[0].fields, vec!["", "Mainlines", "Deora"]);
    }

    #[tokio::test]
    async fn empty_collection_loads_default_header() {
        let (_dir, state) = setup().await;
        let table = load_collection(&state).await.unwrap();
        assert!(table.records.is_empty());
        assert_eq!(table.columns, DEFAULT_COLLECTION_HEADER);
    }
}
