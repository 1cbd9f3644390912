use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum BeaconError {
    Config(String),
    StorageUnavailable(String),
    Enrichment(String),
    Unauthorized(String),
    Validation(String),
    Io(String),
    Serialization(String),
}

impl BeaconError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            BeaconError::Config(_) => "E001",
            BeaconError::StorageUnavailable(_) => "E002",
            BeaconError::Enrichment(_) => "E003",
            BeaconError::Unauthorized(_) => "E004",
            BeaconError::Validation(_) => "E005",
            BeaconError::Io(_) => "E006",
            BeaconError::Serialization(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            BeaconError::Config(_) => "Configuration Error",
            BeaconError::StorageUnavailable(_) => "Storage Unavailable",
            BeaconError::Enrichment(_) => "Enrichment Failure",
            BeaconError::Unauthorized(_) => "Unauthorized",
            BeaconError::Validation(_) => "Validation Error",
            BeaconError::Io(_) => "I/O Error",
            BeaconError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            BeaconError::Config(msg) => msg,
            BeaconError::StorageUnavailable(msg) => msg,
            BeaconError::Enrichment(msg) => msg,
            BeaconError::Unauthorized(msg) => msg,
            BeaconError::Validation(msg) => msg,
            BeaconError::Io(msg) => msg,
            BeaconError::Serialization(msg) => msg,
        }
    }

    /// HTTP 状态码映射
    ///
    /// 401 / 400 / 503 三类对操作者可区分："密码错误"、"请求格式错误"、"存储不可用"
    pub fn http_status(&self) -> StatusCode {
        match self {
            BeaconError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BeaconError::Validation(_) => StatusCode::BAD_REQUEST,
            BeaconError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BeaconError::Config(_)
            | BeaconError::Enrichment(_)
            | BeaconError::Io(_)
            | BeaconError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端输出）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for BeaconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for BeaconError {}

// 便捷的构造函数
impl BeaconError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        BeaconError::Config(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        BeaconError::StorageUnavailable(msg.into())
    }

    pub fn enrichment<T: Into<String>>(msg: T) -> Self {
        BeaconError::Enrichment(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        BeaconError::Unauthorized(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        BeaconError::Validation(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        BeaconError::Io(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        BeaconError::Serialization(msg.into())
    }
}

// 数据库错误一律视为存储不可用，交由调用方决定吞掉还是返回 503
impl From<sea_orm::DbErr> for BeaconError {
    fn from(err: sea_orm::DbErr) -> Self {
        BeaconError::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for BeaconError {
    fn from(err: std::io::Error) -> Self {
        BeaconError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BeaconError {
    fn from(err: serde_json::Error) -> Self {
        BeaconError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BeaconError>;
