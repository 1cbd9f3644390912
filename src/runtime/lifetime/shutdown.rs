use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::IngestService;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，然后做收尾
pub async fn listen_for_shutdown(ingest: Arc<IngestService>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    let result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(&ingest),
    )
    .await;

    if result.is_err() {
        error!(
            "Shutdown tasks timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        );
    }
}

async fn perform_shutdown_tasks(ingest: &IngestService) {
    let counters = ingest.counters();
    info!(
        accepted = counters.accepted,
        geo_timeouts = counters.geo_timeouts,
        geo_failures = counters.geo_failures,
        store_failures = counters.store_failures,
        forwarded = counters.forwarded,
        forward_failures = counters.forward_failures,
        "Ingest counters at shutdown"
    );

    // 内存后端的数据随进程结束丢失
    if let Err(e) = ingest.store().health_check().await {
        warn!("Store unhealthy at shutdown: {}", e);
    } else if ingest.store().backend_name() == "memory" {
        warn!("In-memory store: collected page views are discarded on exit");
    }
}
