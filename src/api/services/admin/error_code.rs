//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::BeaconError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 存储错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    AdminDisabled = 2001,

    // 存储错误 3000-3099
    StorageUnavailable = 3000,
}

impl From<&BeaconError> for ErrorCode {
    fn from(err: &BeaconError) -> Self {
        match err {
            BeaconError::Unauthorized(_) => ErrorCode::Unauthorized,
            BeaconError::Validation(_) => ErrorCode::BadRequest,
            BeaconError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            BeaconError::Config(_)
            | BeaconError::Enrichment(_)
            | BeaconError::Io(_)
            | BeaconError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
