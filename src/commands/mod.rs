//! # Command 处理模块
//!
//! 每个 command 接收 `AppState` 和已反序列化的请求体，返回 `{ success: true, ... }`
//! 形式的 JSON。错误以 `AppError` 返回，由 `server` 统一转换为
//! `{ success: false, error }` 并映射 HTTP 状态码。
//! - `collection` - 收藏清单的查询、增删改、加字段、统计
//! - `series` - 系列分类的查询和编辑
//! - `preorders` - 预订清单的增删改查和统计
//! - `tools` - 备份列表与恢复、年份格式规范化

pub mod collection;
pub mod preorders;
pub mod series;
pub mod tools;

use serde_json::{Map, Value};

use crate::services::parser::cell_to_string;

/// 把请求中的 `{ 字段: 值 }` 转为有序的更新列表，值统一转为文本
pub(crate) fn updates_from_map(updates: Map<String, Value>) -> Vec<(String, String)> {
    updates
        .into_iter()
        .map(|(field, value)| {
            let value = cell_to_string(&value);
            (field, value)
        })
        .collect()
}
