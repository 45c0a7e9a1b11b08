//! # 工具函数模块
//!
//! - `path` - 默认目录、路径校验和备份文件名拆分

pub mod path;
