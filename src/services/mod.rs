//! # 业务逻辑服务模块
//!
//! 包含核心业务逻辑的实现，与 command 层和菜单解耦：
//! - `state` - 应用状态：配置、系列分类、按文件加锁、备份记录
//! - `parser` - JSON Lines 表格文件的解析和序列化
//! - `store` - 记录存储：加载、增删改、加字段，统一的备份与原子写入流程
//! - `file_guard` - 文件写入守卫：写前备份 + 原子写入
//! - `backup` - 时间戳备份、latest 副本、清理与恢复
//! - `collection` - 收藏清单业务规则
//! - `preorders` - 预订清单业务规则与统计
//! - `series` - 系列分类文件的读写
//! - `search` - 全字段搜索
//! - `statistics` - 收藏统计与列概要
//! - `year_format` - 车型名称年份规范化
//! - `export` - Markdown/JSON 导出
//! - `config` - 配置文件读写

pub mod backup;
pub mod collection;
pub mod config;
pub mod export;
pub mod file_guard;
pub mod parser;
pub mod preorders;
pub mod search;
pub mod series;
pub mod state;
pub mod statistics;
pub mod store;
pub mod year_format;
