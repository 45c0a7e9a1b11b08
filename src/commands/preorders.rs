//! # 预订清单 Commands

use chrono::NaiveDate;
use serde_json::{Map, Value, json};

use crate::commands::updates_from_map;
use crate::error::AppResult;
use crate::models::preorder::PreorderInput;
use crate::services::preorders;
use crate::services::state::AppState;

pub async fn list_preorders(state: &AppState) -> AppResult<Value> {
    let table = preorders::load_preorders(state).await?;
    Ok(json!({
        "success": true,
        "data": table.to_json_rows(),
        "columns": table.columns,
        "total_records": table.records.len(),
    }))
}

/// `today` 由调用方传入（HTTP 层使用本地日期）
pub async fn preorder_statistics(state: &AppState, today: NaiveDate) -> AppResult<Value> {
    let table = preorders::load_preorders(state).await?;
    Ok(json!({
        "success": true,
        "statistics": preorders::preorder_stats(&table, today),
    }))
}

pub async fn add_preorder(state: &AppState, input: PreorderInput, today: NaiveDate) -> AppResult<Value> {
    let id = preorders::add_preorder(state, input, today).await?;
    Ok(json!({
        "success": true,
        "serial_number": id,
        "message": format!("已添加预订 #{}", id),
    }))
}

pub async fn update_preorder(state: &AppState, id: u64, updates: Map<String, Value>) -> AppResult<Value> {
    preorders::update_preorder(state, id, updates_from_map(updates)).await?;
    Ok(json!({
        "success": true,
        "message": format!("已更新预订 #{}", id),
    }))
}

pub async fn delete_preorder(state: &AppState, id: u64) -> AppResult<Value> {
    preorders::delete_preorder(state, id).await?;
    Ok(json!({
        "success": true,
        "message": format!("已删除预订 #{}，其余预订已重新编号", id),
    }))
}
