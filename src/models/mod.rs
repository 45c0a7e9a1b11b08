//! # 数据模型模块
//!
//! 纯数据结构与不涉及 I/O 的领域规则，读写和并发控制在 `services` 中处理。
//! - `table` - 表格（表头 + 记录）与字段名校验
//! - `series` - 系列分类及快捷输入解析
//! - `preorder` - 预订清单的表头与输入
//! - `stats` - 统计结果结构
//! - `settings` - 应用配置

pub mod preorder;
pub mod series;
pub mod settings;
pub mod stats;
pub mod table;
