//! # 预订数据模型
//!
//! 预订清单与收藏清单使用相同的 JSONL 表格格式，表头固定为 `PREORDER_HEADER`。

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 预订清单表头
pub const PREORDER_HEADER: &[&str] = &[
    "S.No",
    "Seller",
    "Models",
    "ETA",
    "Total Price",
    "PO Amount",
    "On Arrival Amount",
    "Delivery Status",
    "Date Added",
];

/// 旧版文件中的列名迁移：（旧名，新名）
pub const PREORDER_RENAMED_COLUMNS: &[(&str, &str)] = &[("Status", "Delivery Status")];

/// 默认的到货状态
pub const DEFAULT_DELIVERY_STATUS: &str = "Pending";

/// 新增预订的输入
///
/// 金额字段同时接受字符串和数字（`"1,200"`、`1200`）。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreorderInput {
    pub seller: String,
    pub models: String,
    pub eta: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub po_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub on_arrival_amount: String,
    pub delivery_status: Option<String>,
}

impl PreorderInput {
    /// 按表头顺序排列的字段（不含编号、ETA 规范化和日期由调用方处理）
    pub fn into_fields(self, eta: String, date_added: String) -> Vec<String> {
        let status = self
            .delivery_status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string());
        vec![
            self.seller.trim().to_string(),
            self.models.trim().to_string(),
            eta,
            self.total_price.trim().to_string(),
            self.po_amount.trim().to_string(),
            self.on_arrival_amount.trim().to_string(),
            status,
            date_added,
        ]
    }
}

/// 字符串、数字、布尔、null 统一转为文本
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_numbers_and_strings() {
        let input: PreorderInput = serde_json::from_str(
            r#"{"seller":"Shop","models":"Deora","total_price":1200,"po_amount":"₹ 200","on_arrival_amount":null}"#,
        )
        .unwrap();
        assert_eq!(input.total_price, "1200");
        assert_eq!(input.po_amount, "₹ 200");
        assert_eq!(input.on_arrival_amount, "");
        assert_eq!(input.eta, "");
    }

    #[test]
    fn fields_follow_header_order() {
        let input = PreorderInput {
            seller: " Shop ".into(),
            models: "Deora".into(),
            delivery_status: Some("  ".into()),
            ..Default::default()
        };
        let fields = input.into_fields("2025-03".into(), "2025-01-15".into());
        assert_eq!(fields.len(), PREORDER_HEADER.len() - 1);
        assert_eq!(fields[0], "Shop");
        assert_eq!(fields[6], "Pending");
        assert_eq!(fields[7], "2025-01-15");
    }
}
