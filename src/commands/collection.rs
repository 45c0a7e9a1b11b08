//! # 收藏清单 Commands
//!
//! - `get_data` - 全部记录
//! - `search` - 全字段搜索
//! - `get_stats` - 列概要
//! - `get_analytics` - 收藏统计（分析页）
//! - `dropdown_options` - 主系列 → 子系列 下拉选项
//! - `add_model` / `update_model` / `delete_model` - 车型增删改
//! - `add_field` - 新增字段

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::commands::updates_from_map;
use crate::error::AppResult;
use crate::services::state::AppState;
use crate::services::{collection, statistics};

#[derive(Debug, Deserialize)]
pub struct AddModelRequest {
    pub model_name: String,
    /// 主系列
    pub series: String,
    pub subseries: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModelRequest {
    pub serial_number: u64,
    #[serde(default)]
    pub updates: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteModelRequest {
    pub serial_number: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddFieldRequest {
    pub field_name: String,
}

/// 读取全部记录
///
/// 收藏清单尚未创建时返回空列表和默认表头。
pub async fn get_data(state: &AppState) -> AppResult<Value> {
    let table = collection::load_collection(state).await?;
    let total = table.records.len();
    Ok(json!({
        "success": true,
        "data": table.to_json_rows(),
        "columns": table.columns,
        "total_records": total,
        "message": format!("已加载 {} 条记录", total),
    }))
}

pub async fn search(state: &AppState, query: &str) -> AppResult<Value> {
    let store = collection::store(state);
    let (columns, hits) = if store.path().exists() {
        store.search(query).await?
    } else {
        (collection::load_collection(state).await?.columns, Vec::new())
    };
    let data: Vec<Value> = hits.iter().map(|r| r.to_json(&columns)).collect();
    Ok(json!({
        "success": true,
        "total_found": data.len(),
        "data": data,
        "search_query": query,
    }))
}

pub async fn get_stats(state: &AppState) -> AppResult<Value> {
    let table = collection::load_collection(state).await?;
    Ok(json!({
        "success": true,
        "stats": statistics::table_summary(&table),
    }))
}

pub async fn get_analytics(state: &AppState) -> AppResult<Value> {
    let table = collection::load_collection(state).await?;
    let stats = statistics::collection_stats(&table, &state.catalog());
    Ok(json!({
        "success": true,
        "statistics": stats,
    }))
}

pub async fn dropdown_options(state: &AppState) -> AppResult<Value> {
    Ok(json!({
        "success": true,
        "series": state.catalog().options_map(),
    }))
}

pub async fn add_model(state: &AppState, req: AddModelRequest) -> AppResult<Value> {
    let id = collection::add_model(state, &req.model_name, &req.series, &req.subseries).await?;
    Ok(json!({
        "success": true,
        "message": format!("已添加车型 '{}'（编号 {}）", req.model_name.trim(), id),
        "serial_number": id,
    }))
}

pub async fn update_model(state: &AppState, req: UpdateModelRequest) -> AppResult<Value> {
    let updates = updates_from_map(req.updates);
    collection::update_model(state, req.serial_number, &updates).await?;
    Ok(json!({
        "success": true,
        "message": format!("已更新编号 {} 的 {} 个字段", req.serial_number, updates.len()),
    }))
}

pub async fn delete_model(state: &AppState, req: DeleteModelRequest) -> AppResult<Value> {
    let removed = collection::delete_model(state, req.serial_number).await?;
    let name = removed.fields.first().cloned().unwrap_or_default();
    Ok(json!({
        "success": true,
        "message": format!("已删除编号 {} 的车型 '{}'，其余记录已重新编号", req.serial_number, name),
    }))
}

pub async fn add_field(state: &AppState, req: AddFieldRequest) -> AppResult<Value> {
    let column_index = collection::add_field(state, &req.field_name).await?;
    Ok(json!({
        "success": true,
        "message": format!("已新增字段 '{}'", req.field_name.trim()),
        "column_index": column_index,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::settings::AppConfig;

    async fn setup() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();
        (dir, state)
    }

    fn add_req(name: &str) -> AddModelRequest {
        AddModelRequest {
            model_name: name.into(),
            series: "Mainlines".into(),
            subseries: "Mainlines".into(),
        }
    }

    #[tokio::test]
    async fn empty_collection_has_default_columns() {
        let (_dir, state) = setup().await;
        let body = get_data(&state).await.unwrap();
        assert_eq!(body["total_records"], 0);
        assert_eq!(body["columns"][1], "Model Name");

        let found = search(&state, "x").await.unwrap();
        assert_eq!(found["total_found"], 0);
    }

    #[tokio::test]
    async fn crud_round() {
        let (_dir, state) = setup().await;
        let body = add_model(&state, add_req("Twin Mill")).await.unwrap();
        assert_eq!(body["serial_number"], 1);
        add_model(&state, add_req("Deora")).await.unwrap();

        let req: UpdateModelRequest = serde_json::from_value(json!({
            "serial_number": 2,
            "updates": { "Model Name": "Deora II" }
        }))
        .unwrap();
        update_model(&state, req).await.unwrap();

        let found = search(&state, "deora").await.unwrap();
        assert_eq!(found["total_found"], 1);
        assert_eq!(found["data"][0]["Model Name"], "Deora II");

        delete_model(&state, DeleteModelRequest { serial_number: 1 })
            .await
            .unwrap();
        let body = get_data(&state).await.unwrap();
        assert_eq!(body["data"][0]["S.No"], 1);
        assert_eq!(body["data"][0]["Model Name"], "Deora II");

        let err = delete_model(&state, DeleteModelRequest { serial_number: 7 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_field_reports_index() {
        let (_dir, state) = setup().await;
        add_model(&state, add_req("Twin Mill")).await.unwrap();
        let body = add_field(
            &state,
            AddFieldRequest {
                field_name: "Colour".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(body["column_index"], 4);
    }

    #[tokio::test]
    async fn analytics_and_options() {
        let (_dir, state) = setup().await;
        add_model(&state, add_req("Twin Mill")).await.unwrap();
        let body = get_analytics(&state).await.unwrap();
        assert_eq!(body["statistics"]["total_models"], 1);
        assert_eq!(
            body["statistics"]["main_series_breakdown"][0]["name"],
            "Mainlines"
        );

        let options = dropdown_options(&state).await.unwrap();
        assert_eq!(options["series"]["Premiums"][0], "Premiums Pop Culture");

        let stats = get_stats(&state).await.unwrap();
        assert_eq!(stats["stats"]["column_info"][1]["type"], "text");
    }
}
