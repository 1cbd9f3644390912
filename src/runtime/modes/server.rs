//! Server mode
//!
//! This module contains the HTTP server startup logic.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::configure_routes;
use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::StaticAssets;
use crate::api::services::admin::LoginRateKey;
use crate::config::ServerConfig;
use crate::runtime::lifetime;

/// `web::Bytes` 提取器的请求体上限（采集接口自己读流限长）
const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Build CORS middleware from configuration
///
/// 采集接口通常被其它源的页面调用，默认允许任意 Origin；不携带凭据
fn build_cors_middleware(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::default();
    }

    let mut cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors = cors
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .allowed_header(actix_web::http::header::AUTHORIZATION)
        .max_age(3600);
    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = crate::config::get_config();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let store = startup.store.clone();
    let ingest = startup.ingest.clone();
    let dashboard = startup.dashboard.clone();

    let server_config: ServerConfig = config.server.clone();
    let cpu_count = server_config.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let assets = StaticAssets::new(&server_config.static_dir);
    let cors_origins = server_config.cors_origins.clone();
    let login_rate_key = if config.admin.login_limit_by_forwarded {
        warn!("Login rate limit keyed on forwarded client address; the proxy must overwrite X-Forwarded-For");
        LoginRateKey::Forwarded
    } else {
        LoginRateKey::Peer
    };
    let ingest_for_shutdown = ingest.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&cors_origins))
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache")))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(ingest.clone()))
            .app_data(web::Data::new(dashboard.clone()))
            .app_data(web::Data::new(assets.clone()))
            .app_data(web::Data::new(login_rate_key))
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .configure(configure_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", server_config.host, server_config.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res.context("HTTP server error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(ingest_for_shutdown) => {
            warn!("Graceful shutdown complete");
        }
    }

    Ok(())
}
