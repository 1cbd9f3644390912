use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

use crate::storage::EventStore;

/// 就绪检查的存储超时
const READY_TIMEOUT_SECS: u64 = 5;

/// Health Service
///
/// /health 不依赖任何组件；/health/ready 探测存储
pub struct HealthService;

impl HealthService {
    pub async fn liveness() -> impl Responder {
        trace!("Received liveness check");
        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("OK")
    }

    pub async fn readiness(store: web::Data<Arc<dyn EventStore>>) -> impl Responder {
        let check = tokio::time::timeout(
            Duration::from_secs(READY_TIMEOUT_SECS),
            store.health_check(),
        )
        .await;

        match check {
            Ok(Ok(())) => HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body("OK"),
            Ok(Err(e)) => {
                error!("Readiness check failed ({}): {}", store.backend_name(), e);
                HttpResponse::ServiceUnavailable()
                    .content_type("text/plain; charset=utf-8")
                    .body("Storage unavailable")
            }
            Err(_) => {
                error!(
                    "Readiness check timed out after {}s ({})",
                    READY_TIMEOUT_SECS,
                    store.backend_name()
                );
                HttpResponse::ServiceUnavailable()
                    .content_type("text/plain; charset=utf-8")
                    .body("Storage unavailable")
            }
        }
    }
}

/// 健康检查路由 `/health`
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::liveness))
        .route("", web::head().to(HealthService::liveness))
        .route("/ready", web::get().to(HealthService::readiness))
}
