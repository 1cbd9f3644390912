//! Admin API 帮助函数

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::errors::BeaconError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 信封响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 成功时直接返回业务 JSON（前端按字段读取，不套信封）
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(data)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 BeaconError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_beacon(err: &BeaconError) -> HttpResponse {
    error_response(err.http_status(), ErrorCode::from(err), err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(result: Result<T, BeaconError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_beacon(&e),
    }
}

/// 读取 `Authorization: Bearer <token>`；缺失或格式不对时返回空串
pub fn extract_bearer_token(req: &HttpRequest) -> &str {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .unwrap_or("")
}
