//! Admin API 路由配置

use actix_web::web;

use super::auth::{login, login_rate_limiter};
use super::dashboard::{delete_logs, get_dashboard, get_diagnostics, get_public_stats};

/// 管理与统计路由（挂在 /api 下）
///
/// 包含：
/// - POST /auth - 登录（带限流）
/// - GET /dashboard - Dashboard 聚合数据
/// - DELETE /logs - 删除访问记录
/// - GET /stats - 公开访问计数
/// - GET /diagnostics - 采集错误计数
pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth", web::post().to(login).wrap(login_rate_limiter()))
        .route("/dashboard", web::get().to(get_dashboard))
        .route("/logs", web::delete().to(delete_logs))
        .route("/stats", web::get().to(get_public_stats))
        .route("/diagnostics", web::get().to(get_diagnostics));
}
