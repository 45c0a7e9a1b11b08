//! # JSONL 表格解析服务
//!
//! 表格文件采用 JSON Lines 格式：
//! ```text
//! ["S.No","Model Name","Series"]
//! [1,"Twin Mill","Mainlines"]
//! [2,"Bone Shaker","Ultra Hots"]
//! ```
//! 第一行是表头数组，之后每行是一条记录，数组第一个元素为整数编号。
//!
//! ## 容错策略
//! - 空行跳过
//! - 字段数少于表头时补空字符串；数字、布尔值转为文本，`null` 视为空字符串
//! - 无法解析的行直接报错而非静默跳过：下一次写入会覆盖整个文件，跳过等于丢数据

use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::table::{Record, Table};

/// 读取并解析整个表格文件
///
/// # 错误
/// - 文件不存在 → `NotFound`
/// - 表头缺失或某行格式错误 → `Validation`
pub async fn read_table(path: &Path) -> AppResult<Table> {
    if !path.exists() {
        return Err(AppError::not_found(format!(
            "表格文件不存在: {}",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_table(&content)
}

/// 从文本内容解析表格
pub fn parse_table(content: &str) -> AppResult<Table> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| AppError::validation("表格文件为空或缺少表头"))?;
    let columns: Vec<String> = serde_json::from_str(header_line)
        .map_err(|e| AppError::validation(format!("表头解析失败: {}", e)))?;
    if columns.is_empty() {
        return Err(AppError::validation("表头至少需要包含编号列"));
    }

    let width = columns.len() - 1;
    let mut records = Vec::new();
    for (line_no, line) in lines {
        let cells: Vec<Value> = serde_json::from_str(line)
            .map_err(|e| AppError::validation(format!("第 {} 行解析失败: {}", line_no + 1, e)))?;
        let mut cells = cells.into_iter();

        let id = cells
            .next()
            .as_ref()
            .and_then(parse_id)
            .ok_or_else(|| AppError::validation(format!("第 {} 行缺少有效的编号", line_no + 1)))?;

        let mut fields: Vec<String> = cells.map(|v| cell_to_string(&v)).collect();
        if fields.len() > width {
            log::warn!(
                "第 {} 行字段数 {} 超过表头列数 {}，多余字段已忽略",
                line_no + 1,
                fields.len(),
                width
            );
        }
        fields.resize(width, String::new());
        records.push(Record { id, fields });
    }

    Ok(Table { columns, records })
}

/// 将表格序列化为 JSONL 文本（末尾带换行）
pub fn serialize_table(table: &Table) -> AppResult<String> {
    // 预分配足够的缓冲区容量，减少重新分配次数
    let mut content = String::with_capacity((table.records.len() + 1) * 64);

    content.push_str(&serde_json::to_string(&table.columns)?);
    content.push('\n');

    for record in &table.records {
        let mut row: Vec<Value> = Vec::with_capacity(record.fields.len() + 1);
        row.push(Value::from(record.id));
        row.extend(record.fields.iter().map(|f| Value::String(f.clone())));
        content.push_str(&serde_json::to_string(&row)?);
        content.push('\n');
    }

    Ok(content)
}

/// 编号单元格：整数或纯数字字符串
fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 普通单元格统一转为文本
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
