//! # 统计结果数据模型
//!
//! 收藏统计、列概要和预订统计的返回结构，序列化为 snake_case JSON 返回给调用方。
//! 所有计数列表都已按数量降序、名称升序排好。

use serde::Serialize;
use serde_json::Value;

/// 单个分类值的计数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
    /// 占记录总数的百分比（保留 1 位小数）
    pub percentage: f64,
}

/// 收藏统计（分析页）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionStats {
    pub total_models: usize,
    /// 按子系列（`Series` 列）计数
    pub series_breakdown: Vec<CountEntry>,
    /// 按主系列计数，无法归类的计入 "Others"
    pub main_series_breakdown: Vec<CountEntry>,
    /// 最近添加的 10 条记录，最新的在前，附带 `Main Series` 字段
    pub recent_additions: Vec<Value>,
    pub collection_goals: CollectionGoals,
    pub collection_insights: CollectionInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionGoals {
    pub current_count: usize,
    /// 已达到最大里程碑时为 `None`
    pub next_milestone: Option<usize>,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollectionInsights {
    /// 收藏最多的 3 个主系列
    pub top_series: Vec<CountEntry>,
    /// 主系列分布均衡度：`(1 - (max-min)/max) * 100`
    pub diversity_score: Option<f64>,
    /// 收藏最多的 5 个子系列
    pub top_subseries: Vec<CountEntry>,
    pub series_coverage: Option<SeriesCoverage>,
    /// 车型名称中最常见的 8 个词
    pub common_words: Vec<WordCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesCoverage {
    pub covered: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// `/api/stats` 返回的列概要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub total_models: usize,
    pub columns: Vec<String>,
    /// 与 `columns` 一一对应
    pub column_info: Vec<ColumnSummary>,
}

/// 单列概要：全部非空值都是数字时为数值列，否则为文本列
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnSummary {
    Text {
        column: String,
        unique_values: usize,
        top_values: Vec<CountEntry>,
    },
    Numeric {
        column: String,
        min: f64,
        max: f64,
        mean: f64,
    },
}

/// 预订统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreorderStats {
    pub total_preorders: usize,
    pub total_value: f64,
    pub total_po_amount: f64,
    pub total_on_arrival: f64,
    /// 全部预付款 + 已发货/已送达订单的到付款
    pub payment_done: f64,
    /// 待发货订单的到付款
    pub payment_remaining: f64,
    pub status_breakdown: Vec<CountEntry>,
    pub upcoming_arrivals: Vec<UpcomingArrival>,
}

/// 本月或下月预计到货的预订
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingArrival {
    pub serial: u64,
    pub seller: String,
    pub models: String,
    /// `YYYY-MM`
    pub month: String,
    pub status: String,
}
