//! Dashboard 查询、删除与诊断接口

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::{debug, error};

use crate::errors::BeaconError;
use crate::services::{DashboardService, DeleteLogsRequest};

use super::error_code::ErrorCode;
use super::helpers::{
    api_result, error_from_beacon, error_response, extract_bearer_token, success_response,
};
use super::types::{DashboardQuery, DeleteLogsResponse};

fn log_storage_error(context: &str, err: &BeaconError) {
    if matches!(err, BeaconError::StorageUnavailable(_)) {
        error!("{} failed: {}", context, err);
    }
}

/// GET /api/dashboard?filter=
pub async fn get_dashboard(
    req: HttpRequest,
    query: web::Query<DashboardQuery>,
    dashboard: web::Data<Arc<DashboardService>>,
) -> HttpResponse {
    let secret = extract_bearer_token(&req);
    let result = dashboard
        .get_dashboard(query.filter.as_deref(), secret)
        .await;
    if let Err(e) = &result {
        log_storage_error("Dashboard query", e);
    }
    api_result(result)
}

/// DELETE /api/logs
pub async fn delete_logs(
    req: HttpRequest,
    body: web::Bytes,
    dashboard: web::Data<Arc<DashboardService>>,
) -> HttpResponse {
    let secret = extract_bearer_token(&req);
    // 先认证，未认证的请求不暴露请求体校验细节
    if !dashboard.authenticate(secret) {
        return error_from_beacon(&BeaconError::unauthorized("invalid admin secret"));
    }

    let request: DeleteLogsRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            debug!("Malformed delete body: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Expected JSON body {\"ids\": [...]} or {\"all\": true}",
            );
        }
    };

    match dashboard.delete_logs(request, secret).await {
        Ok(outcome) => success_response(DeleteLogsResponse {
            success: true,
            message: format!("Deleted {} logs", outcome.deleted),
            deleted: outcome.deleted,
        }),
        Err(e) => {
            log_storage_error("Log deletion", &e);
            error_from_beacon(&e)
        }
    }
}

/// GET /api/stats（公开，只暴露总访问量）
pub async fn get_public_stats(dashboard: web::Data<Arc<DashboardService>>) -> HttpResponse {
    let result = dashboard.get_public_stats().await;
    if let Err(e) = &result {
        log_storage_error("Public stats", e);
    }
    api_result(result)
}

/// GET /api/diagnostics
pub async fn get_diagnostics(
    req: HttpRequest,
    dashboard: web::Data<Arc<DashboardService>>,
) -> HttpResponse {
    api_result(dashboard.diagnostics(extract_bearer_token(&req)))
}
