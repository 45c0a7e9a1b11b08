//! # 年份格式规范化
//!
//! 把车型名称中的年份统一写成 `'YY` 形式：
//! - `2020 Mustang` → `'20 Mustang`
//! - `1012 Ferrari` → `'12 Ferrari`
//! - `12 Corvette` → `'12 Corvette`
//! - `'12 Porsche` → 不变
//!
//! 只处理独立的数字：`GT500`、`12345` 这类更长数字串或与字母相连的数字不受影响。

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::AppResult;
use crate::models::table::Table;
use crate::services::collection;
use crate::services::state::AppState;

/// 四位年份：1000-2099
static FOUR_DIGIT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:1[0-9]{3}|20[0-9]{2})\b").unwrap());

/// 独立的两位数
static TWO_DIGIT_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9]{2}\b").unwrap());

/// 一条车型名称的修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearChange {
    pub serial_number: u64,
    pub original: String,
    pub converted: String,
}

/// 规范化文本中的年份写法
pub fn convert_year_format(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let pass = FOUR_DIGIT_YEAR.replace_all(text, |caps: &Captures| {
        let m = &caps[0];
        if preceded_by_apostrophe(text, caps) {
            m.to_string()
        } else {
            format!("'{}", &m[m.len() - 2..])
        }
    });

    let intermediate = pass.into_owned();
    TWO_DIGIT_YEAR
        .replace_all(&intermediate, |caps: &Captures| {
            if preceded_by_apostrophe(&intermediate, caps) {
                caps[0].to_string()
            } else {
                format!("'{}", &caps[0])
            }
        })
        .into_owned()
}

fn preceded_by_apostrophe(haystack: &str, caps: &Captures) -> bool {
    caps.get(0)
        .map(|m| haystack[..m.start()].ends_with('\''))
        .unwrap_or(false)
}

/// 找出车型名称列：表头同时包含 "model" 和 "name" 的列，否则第 2 列
pub fn model_name_column(table: &Table) -> Option<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, c)| {
            let lower = c.to_lowercase();
            lower.contains("model") && lower.contains("name")
        })
        .map(|(idx, _)| idx)
        .or_else(|| (table.columns.len() > 1).then_some(1))
}

/// 计算整张表上需要修改的车型名称（不修改表格）
pub fn plan_changes(table: &Table) -> Vec<YearChange> {
    let Some(idx) = model_name_column(table) else {
        return Vec::new();
    };
    table
        .records
        .iter()
        .filter_map(|record| {
            let original = record.fields.get(idx - 1)?;
            let converted = convert_year_format(original);
            (converted != *original).then(|| YearChange {
                serial_number: record.id,
                original: original.clone(),
                converted,
            })
        })
        .collect()
}

/// 规范化收藏清单中所有车型名称的年份，返回修改列表
///
/// 没有需要修改的名称时不做备份也不写文件；否则一次备份、一次写入。
pub async fn convert_model_names(state: &AppState) -> AppResult<Vec<YearChange>> {
    let store = collection::store(state);
    if plan_changes(&store.load().await?).is_empty() {
        log::info!("所有车型名称的年份格式均已规范，无需修改");
        return Ok(Vec::new());
    }

    let changes = store
        .mutate("convert_years", false, |table| {
            let changes = plan_changes(table);
            if let Some(idx) = model_name_column(table) {
                for change in &changes {
                    if let Some(pos) = table.position(change.serial_number) {
                        table.records[pos].fields[idx - 1] = change.converted.clone();
                    }
                }
            }
            Ok(changes)
        })
        .await?;

    log::info!("已规范 {} 个车型名称的年份格式", changes.len());
    Ok(changes)
}
