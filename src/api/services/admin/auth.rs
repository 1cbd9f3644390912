//! 管理口令登录
//!
//! token 就是口令本身，没有会话和过期，只适合低风险部署。

use actix_governor::{Governor, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::services::DashboardService;
use crate::utils::ip::{UNKNOWN_IP, extract_forwarded_ip_from_headers};

use super::error_code::ErrorCode;
use super::helpers::{error_response, success_response};
use super::types::{LoginCredentials, TokenResponse};

/// 登录限流按什么分桶，以 `web::Data<LoginRateKey>` 注册，缺省为 Peer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoginRateKey {
    /// TCP 对端地址。反向代理后面所有客户端共用代理这一个桶
    #[default]
    Peer,
    /// 经过校验的 X-Forwarded-For / X-Real-IP，取不到时退回对端地址。
    /// 只有代理会覆盖这两个头时才安全，否则客户端换个头就换了桶
    Forwarded,
}

/// 按 [`LoginRateKey`] 提取限流 key
#[derive(Clone, Copy, Debug)]
pub struct LoginKeyExtractor;

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        let mode = req
            .app_data::<web::Data<LoginRateKey>>()
            .map(|mode| *mode.get_ref())
            .unwrap_or_default();

        if mode == LoginRateKey::Forwarded
            && let Some(ip) = extract_forwarded_ip_from_headers(req.headers())
        {
            return Ok(ip);
        }

        Ok(req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_IP.to_string()))
    }
}

/// 登录限流：每秒补充 1 次，突发 5 次
pub fn login_rate_limiter() -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    let config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(5)
        .key_extractor(LoginKeyExtractor)
        .finish()
        .expect("Invalid rate limit config");

    debug!("Login rate limiter created: 1 req/s, burst 5");
    Governor::new(&config)
}

/// POST /api/auth
pub async fn login(
    body: web::Bytes,
    dashboard: web::Data<Arc<DashboardService>>,
) -> HttpResponse {
    let credentials: LoginCredentials = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            debug!("Malformed login body: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Expected JSON body {\"password\": \"...\"}",
            );
        }
    };

    if dashboard.authenticate(&credentials.password) {
        info!("Admin login succeeded");
        success_response(TokenResponse {
            token: credentials.password,
        })
    } else {
        warn!("Admin login failed");
        error_response(
            StatusCode::UNAUTHORIZED,
            ErrorCode::AuthFailed,
            "Invalid password",
        )
    }
}
