//! # 收藏统计服务
//!
//! 基于整表数据和系列分类计算统计结果，纯内存计算，不访问文件系统：
//! - `collection_stats` - 分析页：系列分布、最近添加、收藏目标、收藏洞察
//! - `table_summary` - 列概要：文本列的唯一值数量和前 5 个值，数值列的最小/最大/平均值

use std::collections::HashMap;

use serde_json::Value;

use crate::models::series::SeriesCatalog;
use crate::models::stats::{
    CollectionGoals, CollectionInsights, CollectionStats, ColumnSummary, CountEntry,
    SeriesCoverage, TableSummary, WordCount,
};
use crate::models::table::Table;

/// 收藏数量里程碑
const MILESTONES: &[usize] = &[10, 25, 50, 100, 250, 500, 1000];

/// 最近添加展示条数
const RECENT_LIMIT: usize = 10;

/// 无法归入任何主系列时使用的分组名
const FALLBACK_MAIN_SERIES: &str = "Others";

/// 统计常用词时忽略的词
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "series",
];

/// 计算收藏统计
pub fn collection_stats(table: &Table, catalog: &SeriesCatalog) -> CollectionStats {
    let total = table.records.len();
    let series_idx = series_column(table);

    let series_values: Vec<&str> = match series_idx {
        Some(idx) => table
            .records
            .iter()
            .map(|r| r.fields.get(idx - 1).map(String::as_str).unwrap_or(""))
            .collect(),
        None => Vec::new(),
    };

    let series_breakdown = count_values(
        series_values.iter().copied().filter(|s| !s.trim().is_empty()),
        total,
    );
    let main_series_breakdown = count_values(
        series_values.iter().map(|s| main_series_of(catalog, s)),
        total,
    );

    let recent_additions = table
        .records
        .iter()
        .rev()
        .take(RECENT_LIMIT)
        .map(|record| {
            let mut value = record.to_json(&table.columns);
            let sub = series_idx
                .and_then(|idx| record.fields.get(idx - 1))
                .map(String::as_str)
                .unwrap_or("");
            if let Value::Object(obj) = &mut value {
                obj.insert(
                    "Main Series".to_string(),
                    Value::String(main_series_of(catalog, sub).to_string()),
                );
            }
            value
        })
        .collect();

    let collection_insights = CollectionInsights {
        top_series: main_series_breakdown.iter().take(3).cloned().collect(),
        diversity_score: diversity_score(&main_series_breakdown),
        top_subseries: series_breakdown.iter().take(5).cloned().collect(),
        series_coverage: (!main_series_breakdown.is_empty()).then(|| {
            let covered = main_series_breakdown.len();
            let total_series = catalog.series.len();
            SeriesCoverage {
                covered,
                total: total_series,
                percentage: percentage(covered, total_series),
            }
        }),
        common_words: common_words(table, 8),
    };

    CollectionStats {
        total_models: total,
        series_breakdown,
        main_series_breakdown,
        recent_additions,
        collection_goals: collection_goals(total),
        collection_insights,
    }
}

/// 计算每一列的概要信息
pub fn table_summary(table: &Table) -> TableSummary {
    let total = table.records.len();
    let column_info = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let values: Vec<String> = table
                .records
                .iter()
                .map(|r| {
                    if idx == 0 {
                        r.id.to_string()
                    } else {
                        r.fields.get(idx - 1).cloned().unwrap_or_default()
                    }
                })
                .filter(|v| !v.trim().is_empty())
                .collect();

            let numbers: Option<Vec<f64>> =
                values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
            match numbers {
                Some(nums) if !nums.is_empty() => {
                    let min = nums.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = nums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
                    ColumnSummary::Numeric {
                        column: column.clone(),
                        min,
                        max,
                        mean: round_to(mean, 2),
                    }
                }
                _ => {
                    let counts = count_values(values.iter().map(String::as_str), total);
                    ColumnSummary::Text {
                        column: column.clone(),
                        unique_values: counts.len(),
                        top_values: counts.into_iter().take(5).collect(),
                    }
                }
            }
        })
        .collect();

    TableSummary {
        total_models: total,
        columns: table.columns.clone(),
        column_info,
    }
}

/// 统计各值出现次数，按数量降序、名称升序排列
pub(crate) fn count_values<'a>(values: impl Iterator<Item = &'a str>, total: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(name, count)| CountEntry {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(part as f64 / total as f64 * 100.0, 1)
    }
}

/// 子系列列：优先 `Series`，否则第 3 列
fn series_column(table: &Table) -> Option<usize> {
    table
        .column_index("Series")
        .or_else(|| (table.columns.len() > 2).then_some(2))
        .filter(|&idx| idx > 0)
}

/// 车型名称列：优先 `Model Name`，否则第 2 列
fn model_column(table: &Table) -> Option<usize> {
    table
        .column_index("Model Name")
        .or_else(|| (table.columns.len() > 1).then_some(1))
        .filter(|&idx| idx > 0)
}

fn main_series_of<'a>(catalog: &'a SeriesCatalog, subseries: &str) -> &'a str {
    let subseries = subseries.trim();
    if subseries.is_empty() {
        return FALLBACK_MAIN_SERIES;
    }
    catalog
        .find_main_series(subseries)
        .unwrap_or(FALLBACK_MAIN_SERIES)
}

fn collection_goals(total: usize) -> CollectionGoals {
    let next_milestone = MILESTONES.iter().copied().find(|&m| total < m);
    CollectionGoals {
        current_count: total,
        next_milestone,
        progress_percentage: match next_milestone {
            Some(m) => round_to(total as f64 / m as f64 * 100.0, 1),
            None => 100.0,
        },
    }
}

fn diversity_score(breakdown: &[CountEntry]) -> Option<f64> {
    let max = breakdown.iter().map(|e| e.count).max()?;
    let min = breakdown.iter().map(|e| e.count).min()?;
    if max == 0 {
        return Some(0.0);
    }
    if max == min {
        return Some(100.0);
    }
    Some(round_to(
        (1.0 - (max - min) as f64 / max as f64) * 100.0,
        1,
    ))
}

/// 车型名称中最常见的词（按出现次数降序，次数相同时按首次出现顺序）
fn common_words(table: &Table, limit: usize) -> Vec<WordCount> {
    let Some(idx) = model_column(table) else {
        return Vec::new();
    };

    let mut words: Vec<WordCount> = Vec::new();
    for record in &table.records {
        let Some(name) = record.fields.get(idx - 1) else {
            continue;
        };
        for raw in name.split_whitespace() {
            let lower = raw.to_lowercase();
            if raw.chars().count() <= 2 || STOP_WORDS.contains(&lower.as_str()) {
                continue;
            }
            let word = lower.trim_matches(|c| ".,!?()[]{}".contains(c));
            if word.is_empty() {
                continue;
            }
            match words.iter_mut().find(|w| w.word == word) {
                Some(entry) => entry.count += 1,
                None => words.push(WordCount {
                    word: word.to_string(),
                    count: 1,
                }),
            }
        }
    }

    // 稳定排序，保留首次出现顺序
    words.sort_by(|a, b| b.count.cmp(&a.count));
    words.truncate(limit);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut table = Table::with_header(&["S.No", "Model Name", "Series"]);
        for (name, series) in rows {
            table.insert(vec![name.to_string(), series.to_string()]);
        }
        table
    }

    #[test]
    fn empty_collection() {
        let stats = collection_stats(&table(&[]), &SeriesCatalog::default());
        assert_eq!(stats.total_models, 0);
        assert!(stats.series_breakdown.is_empty());
        assert!(stats.main_series_breakdown.is_empty());
        assert_eq!(stats.collection_goals.next_milestone, Some(10));
        assert_eq!(stats.collection_goals.progress_percentage, 0.0);
        assert_eq!(stats.collection_insights.diversity_score, None);
        assert_eq!(stats.collection_insights.series_coverage, None);
    }

    #[test]
    fn breakdowns_group_by_main_series() {
        let t = table(&[
            ("Twin Mill", "Mainlines"),
            ("Deora", "57th Anniversary Series"),
            ("Bone Shaker", "Ultra Hots"),
            ("Custom", "Unknown Line"),
            ("Blank", ""),
        ]);
        let stats = collection_stats(&t, &SeriesCatalog::default());

        assert_eq!(stats.series_breakdown.len(), 4);
        let main: Vec<(&str, usize)> = stats
            .main_series_breakdown
            .iter()
            .map(|e| (e.name.as_str(), e.count))
            .collect();
        assert_eq!(main, vec![("Mainlines", 2), ("Others", 2), ("Silver Series", 1)]);
        assert_eq!(stats.main_series_breakdown[0].percentage, 40.0);

        // 最新的在前，并附带主系列
        assert_eq!(stats.recent_additions[0]["Model Name"], "Blank");
        assert_eq!(stats.recent_additions[0]["Main Series"], "Others");
        assert_eq!(stats.recent_additions[2]["Main Series"], "Silver Series");
        assert_eq!(stats.recent_additions[4]["S.No"], 1);

        let insights = &stats.collection_insights;
        assert_eq!(insights.top_series.len(), 3);
        assert_eq!(insights.diversity_score, Some(50.0));
        let coverage = insights.series_coverage.as_ref().unwrap();
        assert_eq!((coverage.covered, coverage.total, coverage.percentage), (3, 4, 75.0));
    }

    #[test]
    fn goals_follow_milestones() {
        assert_eq!(collection_goals(9).next_milestone, Some(10));
        assert_eq!(collection_goals(10).next_milestone, Some(25));
        assert_eq!(collection_goals(20).progress_percentage, 80.0);
        let done = collection_goals(1000);
        assert_eq!(done.next_milestone, None);
        assert_eq!(done.progress_percentage, 100.0);
    }

    #[test]
    fn recent_additions_are_capped() {
        let rows: Vec<(String, String)> = (0..15)
            .map(|i| (format!("Car {}", i), "Mainlines".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let stats = collection_stats(&table(&refs), &SeriesCatalog::default());
        assert_eq!(stats.recent_additions.len(), 10);
        assert_eq!(stats.recent_additions[0]["S.No"], 15);
        assert_eq!(stats.collection_insights.diversity_score, Some(100.0));
    }

    #[test]
    fn common_words_skip_short_and_stop_words() {
        let t = table(&[
            ("The Nissan Skyline GT-R (R34)", "Premiums Car Culture"),
            ("Nissan Skyline", "Mainlines"),
            ("Nissan Z", "Mainlines"),
            ("Series of the Mill", "Mainlines"),
        ]);
        let words = common_words(&t, 8);
        assert_eq!(words[0], WordCount { word: "nissan".into(), count: 3 });
        assert_eq!(words[1], WordCount { word: "skyline".into(), count: 2 });
        assert!(words.iter().any(|w| w.word == "r34"));
        assert!(words.iter().all(|w| !["the", "series", "z", "of"].contains(&w.word.as_str())));
    }

    #[test]
    fn summary_detects_numeric_columns() {
        let mut t = table(&[("Twin Mill", "Mainlines"), ("Deora", "Mainlines")]);
        t.add_column("Price").unwrap();
        t.update_fields(1, &[("Price".into(), "180".into())]).unwrap();
        t.update_fields(2, &[("Price".into(), "300".into())]).unwrap();

        let summary = table_summary(&t);
        assert_eq!(summary.columns.len(), 4);
        assert_eq!(
            summary.column_info[3],
            ColumnSummary::Numeric {
                column: "Price".into(),
                min: 180.0,
                max: 300.0,
                mean: 240.0
            }
        );
        match &summary.column_info[2] {
            ColumnSummary::Text { unique_values, top_values, .. } => {
                assert_eq!(*unique_values, 1);
                assert_eq!(top_values[0].count, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(summary.column_info[0], ColumnSummary::Numeric { .. }));
    }
}
