//! # 系列分类 Commands
//!
//! 所有编辑操作都通过 `services::series::edit_catalog` 执行：
//! 先在副本上修改，写回 `series.yaml` 成功后再更新内存中的分类。

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppResult;
use crate::models::series::SeriesCatalog;
use crate::services::series::edit_catalog;
use crate::services::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddSeriesRequest {
    pub series_name: String,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub rarity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubseriesRequest {
    pub main_series: String,
    pub subseries: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameSeriesRequest {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameSubseriesRequest {
    pub main_series: String,
    pub old_name: String,
    pub new_name: String,
}

/// 完整的分类（含元数据）和数量统计
pub async fn list_series(state: &AppState) -> AppResult<Value> {
    Ok(catalog_body(&state.catalog(), None))
}

pub async fn add_series(state: &AppState, req: AddSeriesRequest) -> AppResult<Value> {
    let catalog = edit_catalog(state, |c| {
        c.add_series(
            &req.series_name,
            req.description.as_deref(),
            req.price_range.as_deref(),
            req.rarity.as_deref(),
        )
    })
    .await?;
    Ok(catalog_body(
        &catalog,
        Some(format!("已添加系列 '{}'", req.series_name.trim())),
    ))
}

pub async fn add_subseries(state: &AppState, req: SubseriesRequest) -> AppResult<Value> {
    let catalog = edit_catalog(state, |c| c.add_subseries(&req.main_series, &req.subseries)).await?;
    Ok(catalog_body(
        &catalog,
        Some(format!(
            "已将子系列 '{}' 添加到 '{}'",
            req.subseries.trim(),
            req.main_series.trim()
        )),
    ))
}

pub async fn remove_subseries(state: &AppState, req: SubseriesRequest) -> AppResult<Value> {
    let catalog =
        edit_catalog(state, |c| c.remove_subseries(&req.main_series, &req.subseries)).await?;
    Ok(catalog_body(
        &catalog,
        Some(format!(
            "已从 '{}' 中移除子系列 '{}'",
            req.main_series, req.subseries
        )),
    ))
}

pub async fn rename_series(state: &AppState, req: RenameSeriesRequest) -> AppResult<Value> {
    let catalog = edit_catalog(state, |c| c.rename_series(&req.old_name, &req.new_name)).await?;
    Ok(catalog_body(
        &catalog,
        Some(format!("已将系列 '{}' 重命名为 '{}'", req.old_name, req.new_name.trim())),
    ))
}

pub async fn rename_subseries(state: &AppState, req: RenameSubseriesRequest) -> AppResult<Value> {
    let catalog = edit_catalog(state, |c| {
        c.rename_subseries(&req.main_series, &req.old_name, &req.new_name)
    })
    .await?;
    Ok(catalog_body(
        &catalog,
        Some(format!(
            "已将子系列 '{}' 重命名为 '{}'",
            req.old_name,
            req.new_name.trim()
        )),
    ))
}

fn catalog_body(catalog: &SeriesCatalog, message: Option<String>) -> Value {
    let (main_count, sub_count) = catalog.counts();
    let mut body = json!({
        "success": true,
        "series": catalog.series,
        "main_series_count": main_count,
        "subseries_count": sub_count,
    });
    if let (Some(message), Value::Object(obj)) = (message, &mut body) {
        obj.insert("message".to_string(), Value::String(message));
    }
    body
}
