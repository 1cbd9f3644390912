pub mod admin;
pub mod collect;
pub mod frontend;
pub mod health;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

pub use admin::admin_routes;
pub use collect::collect_routes;
pub use frontend::{FrontendService, StaticAssets, frontend_routes};
pub use health::{HealthService, health_routes};

use admin::{ErrorCode, error_response};

async fn api_not_found() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not found")
}

/// 注册全部路由
///
/// 依赖的 `web::Data`：`Arc<IngestService>`、`Arc<DashboardService>`、
/// `Arc<dyn EventStore>`、`StaticAssets`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_routes()).service(
        web::scope("/api")
            .configure(collect_routes)
            .configure(admin_routes)
            .default_service(web::to(api_not_found)),
    );
    frontend_routes(cfg);
}
