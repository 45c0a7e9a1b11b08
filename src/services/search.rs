//! # 全表搜索服务
//!
//! 不区分大小写的子串搜索，匹配范围是记录的每一个字段（包括编号的文本形式）。
//!
//! ## 搜索架构
//! 每条记录的所有字段先拼接为一条小写化的搜索文本（字段之间用换行分隔，避免跨字段误匹配），
//! 再用 `memchr::memmem::Finder` SIMD 加速子串搜索，`rayon` 并行处理所有记录。
//! 并行迭代保持输入顺序，结果按记录编号升序排列。

use rayon::prelude::*;

use crate::models::table::{Record, Table};

/// 在表格中搜索包含 `query` 的记录
///
/// 查询词去除首尾空白后为空时返回全部记录。
pub fn search_records<'a>(table: &'a Table, query: &str) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return table.records.iter().collect();
    }

    let finder = memchr::memmem::Finder::new(needle.as_bytes());
    table
        .records
        .par_iter()
        .filter(|record| finder.find(search_text(record).as_bytes()).is_some())
        .collect()
}

/// 记录的小写化搜索文本
fn search_text(record: &Record) -> String {
    let mut text = record.id.to_string();
    for field in &record.fields {
        text.push('\n');
        text.push_str(&field.to_lowercase());
    }
    text
}
