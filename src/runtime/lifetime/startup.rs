use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::StaticConfig;
use crate::services::{
    DashboardService, DataHubForwarder, GeoIpProvider, IngestService, UserAgentParse,
    WootheeParser,
};
use crate::storage::{EventStore, IdGenerator, StorageFactory};

/// 启动时构建、之后注入到 HTTP 层的组件
pub struct StartupContext {
    pub store: Arc<dyn EventStore>,
    pub ingest: Arc<IngestService>,
    pub dashboard: Arc<DashboardService>,
}

/// 由已构建好的存储组装服务（测试直接调用，注入 mock geo）
pub fn build_services(
    config: &StaticConfig,
    store: Arc<dyn EventStore>,
    geo: Option<GeoIpProvider>,
    last_id: Option<i64>,
) -> StartupContext {
    let user_agents: Arc<dyn UserAgentParse> = Arc::new(WootheeParser);
    let mut ingest = IngestService::new(
        store.clone(),
        geo,
        user_agents,
        IdGenerator::starting_after(last_id),
        &config.analytics,
    );
    if let Some(url) = config.analytics.data_hub_url() {
        info!("Forwarding collected signals to data hub at {}", url);
        ingest = ingest.with_forwarder(
            Arc::new(DataHubForwarder::new(url, config.analytics.geoip_timeout_ms)),
            config.analytics.data_hub_source.clone(),
        );
    }
    let ingest = Arc::new(ingest);
    let dashboard = Arc::new(DashboardService::new(
        store.clone(),
        ingest.clone(),
        config.admin.secret.clone(),
        config.store.page_size(),
    ));

    StartupContext {
        store,
        ingest,
        dashboard,
    }
}

/// 准备服务器启动的上下文：存储、GeoIP、采集与 Dashboard 服务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StorageFactory::create(config)
        .await
        .context("Failed to initialize event store")?;

    let last_id = store
        .last_id()
        .await
        .context("Failed to read last page view id")?;

    let geo = if config.analytics.enable_geo_lookup {
        Some(GeoIpProvider::new(&config.analytics))
    } else {
        warn!("GeoIP lookup disabled, all locations will be recorded as Unknown");
        None
    };

    if config.admin.secret.is_empty() {
        warn!("ADMIN_PASSWORD / admin.secret is not set, the dashboard API will reject every request");
    } else {
        warn!("Admin API uses a single static secret as bearer token; keep it out of untrusted hands");
    }

    let context = build_services(config, store, geo, last_id);

    info!(
        "Pre-startup completed in {} ms (store: {})",
        start_time.elapsed().as_millis(),
        context.store.backend_name()
    );
    Ok(context)
}
