//! # 收藏清单导出服务
//!
//! 将表格导出为 Markdown 或 JSON 格式的字符串，由调用方决定写到哪里。
//!
//! ## 导出策略
//! - **Markdown**：标题 + 导出时间 + 一张包含表头的 Markdown 表格
//! - **JSON**：`{ 列名: 值 }` 对象数组，按表头顺序保留所有字段，美化输出

use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::table::Table;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    /// 导出文件的默认扩展名
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            other => Err(AppError::validation(format!("不支持的导出格式: {}", other))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "Markdown"),
            ExportFormat::Json => write!(f, "JSON"),
        }
    }
}

/// 按指定格式导出
pub fn export_table(table: &Table, format: ExportFormat, title: &str) -> AppResult<String> {
    match format {
        ExportFormat::Markdown => Ok(to_markdown(table, title)),
        ExportFormat::Json => to_json(table),
    }
}

/// 将表格导出为 Markdown 格式字符串
///
/// 单元格中的 `|` 转义为 `\|`，换行替换为空格，保证表格结构不被破坏。
pub fn to_markdown(table: &Table, title: &str) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(table.records.len() + 6);

    lines.push(format!("# {}", title));
    lines.push(String::new());
    lines.push(format!(
        "导出时间: {}，共 {} 条记录",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        table.records.len()
    ));
    lines.push(String::new());

    let header: Vec<String> = table.columns.iter().map(|c| escape_cell(c)).collect();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!(
        "|{}|",
        table.columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));

    for record in &table.records {
        let mut cells = Vec::with_capacity(table.columns.len());
        cells.push(record.id.to_string());
        cells.extend(record.fields.iter().map(|f| escape_cell(f)));
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// 将表格导出为 JSON 格式字符串（2 空格缩进）
pub fn to_json(table: &Table) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(&table.to_json_rows())?)
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}
