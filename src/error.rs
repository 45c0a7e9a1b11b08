//! # 应用错误类型
//!
//! 所有服务层函数统一返回 `Result<T, AppError>`：
//! - `NotFound` - 表格文件或指定编号的记录不存在
//! - `Validation` - 字段名非法、必填输入为空、重复字段等
//! - `Backup` - 备份复制失败（会中止触发它的写操作）
//!
//! 其余变体包装底层 I/O 与序列化错误。command 层将错误转换为
//! `{ success: false, error }` 形式的 JSON 并映射到对应的 HTTP 状态码。

use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 文件或记录不存在
    #[error("{0}")]
    NotFound(String),

    /// 输入校验失败，不会产生任何修改
    #[error("{0}")]
    Validation(String),

    /// 写入前的备份失败，写操作已中止
    #[error("备份失败，操作已中止: {0}")]
    Backup(String),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML 解析失败: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AppError {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Backup(_) | AppError::Io(_) | AppError::Json(_) | AppError::Yaml(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
