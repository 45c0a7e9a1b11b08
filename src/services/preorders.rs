//! # 预订清单服务
//!
//! 预订清单（`preorders.jsonl`）通过与收藏清单相同的 `RecordStore` 读写，
//! 因此同样享有写前备份、删除后重新编号和按文件加锁。
//!
//! ## ETA 规范化
//! ETA 统一存为月份 `YYYY-MM`：
//! - 已经是 `YYYY-MM` → 保留
//! - `YYYY-MM-DD` → 截取月份
//! - 其他内容 → 去除首尾空白后原样保留
//!
//! ## 金额解析
//! 金额列是自由文本，统计时去掉 `₹`、`$`、逗号和空格后解析，无法解析的按 0 计。

use chrono::{Datelike, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::models::preorder::{PREORDER_HEADER, PREORDER_RENAMED_COLUMNS, PreorderInput};
use crate::models::stats::{PreorderStats, UpcomingArrival};
use crate::models::table::{Record, Table};
use crate::services::state::AppState;
use crate::services::statistics::{count_values, round_to};
use crate::services::store::RecordStore;

/// 预订清单的存储句柄
pub fn store(state: &AppState) -> RecordStore<'_> {
    RecordStore::new(state, state.config().preorders_path(), PREORDER_HEADER)
        .with_renamed_columns(PREORDER_RENAMED_COLUMNS)
}

/// 新增预订，返回编号
///
/// # 错误
/// 卖家或车型为空 → `Validation`
pub async fn add_preorder(state: &AppState, input: PreorderInput, today: NaiveDate) -> AppResult<u64> {
    if input.seller.trim().is_empty() {
        return Err(AppError::validation("卖家不能为空"));
    }
    if input.models.trim().is_empty() {
        return Err(AppError::validation("车型不能为空"));
    }

    let eta = normalize_eta(&input.eta);
    let fields = input.into_fields(eta, today.format("%Y-%m-%d").to_string());
    store(state).insert(fields, "add_preorder").await
}

/// 更新预订的若干字段，ETA 字段按月份规范化
pub async fn update_preorder(
    state: &AppState,
    id: u64,
    updates: Vec<(String, String)>,
) -> AppResult<()> {
    let updates: Vec<(String, String)> = updates
        .into_iter()
        .map(|(field, value)| {
            if field == "ETA" {
                let eta = normalize_eta(&value);
                (field, eta)
            } else {
                (field, value)
            }
        })
        .collect();
    store(state).update_fields(id, &updates, "update_preorder").await
}

pub async fn delete_preorder(state: &AppState, id: u64) -> AppResult<Record> {
    store(state).delete(id, "delete_preorder").await
}

/// 读取预订清单；文件尚未创建时返回空表
pub async fn load_preorders(state: &AppState) -> AppResult<Table> {
    store(state).load_or_empty().await
}

/// ETA 规范化为 `YYYY-MM`
pub fn normalize_eta(eta: &str) -> String {
    let eta = eta.trim();
    if eta.len() == 7 && eta.matches('-').count() == 1 {
        return eta.to_string();
    }
    match NaiveDate::parse_from_str(eta, "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m").to_string(),
        Err(_) => eta.to_string(),
    }
}

/// 宽松解析金额：去掉货币符号、逗号和空格，失败按 0
pub fn parse_amount(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// 计算预订统计
///
/// `today` 决定"本月"和"下月"，用于筛选即将到货的预订。
pub fn preorder_stats(table: &Table, today: NaiveDate) -> PreorderStats {
    let total_idx = find_column(table, "Total Price", &["total", "price"]);
    let po_idx = find_column(table, "PO Amount", &["po", "amount"]);
    let arrival_idx = find_column(table, "On Arrival Amount", &["arrival", "amount"]);
    let status_idx = table.column_index("Delivery Status").filter(|&i| i > 0);
    let eta_idx = table.column_index("ETA").filter(|&i| i > 0);

    let cell = |record: &Record, idx: Option<usize>| -> String {
        idx.and_then(|i| record.fields.get(i - 1))
            .cloned()
            .unwrap_or_default()
    };
    let sum = |idx: Option<usize>| -> f64 {
        match idx {
            Some(_) => table
                .records
                .iter()
                .map(|r| parse_amount(&cell(r, idx)))
                .sum(),
            None => 0.0,
        }
    };

    let total_value = sum(total_idx);
    let total_po_amount = sum(po_idx);
    let total_on_arrival = sum(arrival_idx);

    let mut payment_done = total_po_amount;
    let mut payment_remaining = 0.0;
    if arrival_idx.is_some() {
        for record in &table.records {
            let on_arrival = parse_amount(&cell(record, arrival_idx));
            let status = status_of(&cell(record, status_idx), status_idx);
            match status.to_lowercase().as_str() {
                "shipped" | "delivered" => payment_done += on_arrival,
                "pending" => payment_remaining += on_arrival,
                _ => {}
            }
        }
    }

    let statuses: Vec<String> = match status_idx {
        Some(_) => table
            .records
            .iter()
            .map(|r| cell(r, status_idx).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    };
    let status_breakdown = count_values(statuses.iter().map(String::as_str), table.records.len());

    let current_month = today.format("%Y-%m").to_string();
    let next_month = next_month_of(today);
    let mut upcoming_arrivals: Vec<UpcomingArrival> = match eta_idx {
        Some(_) => table
            .records
            .iter()
            .filter_map(|record| {
                let status = status_of(&cell(record, status_idx), status_idx);
                if status == "Delivered" {
                    return None;
                }
                let eta = cell(record, eta_idx);
                let month: String = eta.trim().chars().take(7).collect();
                if month.is_empty() || (month != current_month && month != next_month) {
                    return None;
                }
                Some(UpcomingArrival {
                    serial: record.id,
                    seller: table.field(record, "Seller").unwrap_or("").to_string(),
                    models: table.field(record, "Models").unwrap_or("").to_string(),
                    month,
                    status,
                })
            })
            .collect(),
        None => Vec::new(),
    };
    upcoming_arrivals.sort_by(|a, b| a.month.cmp(&b.month));

    PreorderStats {
        total_preorders: table.records.len(),
        total_value: round_to(total_value, 2),
        total_po_amount: round_to(total_po_amount, 2),
        total_on_arrival: round_to(total_on_arrival, 2),
        payment_done: round_to(payment_done, 2),
        payment_remaining: round_to(payment_remaining, 2),
        status_breakdown,
        upcoming_arrivals,
    }
}

/// 状态列缺失时视为 Pending
fn status_of(value: &str, status_idx: Option<usize>) -> String {
    match status_idx {
        Some(_) => value.trim().to_string(),
        None => "Pending".to_string(),
    }
}

/// 按精确列名、去空格列名、关键字依次查找金额列
fn find_column(table: &Table, name: &str, keywords: &[&str]) -> Option<usize> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let columns = table.columns.iter().enumerate().skip(1);

    columns
        .clone()
        .find(|(_, c)| c.trim() == name)
        .or_else(|| columns.clone().find(|(_, c)| c.trim() == compact))
        .or_else(|| {
            columns.clone().find(|(_, c)| {
                let lower = c.to_lowercase();
                keywords.iter().all(|k| lower.contains(k))
            })
        })
        .map(|(idx, _)| idx)
}

fn next_month_of(today: NaiveDate) -> String {
    if today.month() == 12 {
        format!("{}-01", today.year() + 1)
    } else {
        format!("{}-{:02}", today.year(), today.month() + 1)
    }
}
