//! Page-view ingestion
//!
//! 采集请求 → 地理位置 / UA 富化 → 写入存储。
//! 任何环节失败都不会向客户端暴露，只记录日志并计数。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::config::AnalyticsConfig;
use crate::services::data_hub::{EventForwarder, ForwardError, tagged_payload};
use crate::services::geoip::{GeoError, GeoInfo, GeoIpProvider};
use crate::services::user_agent::UserAgentParse;
use crate::storage::{EventStore, IdGenerator, LOCALHOST, PageView, UNKNOWN};
use crate::utils::ip::should_skip_geolocation;

pub const MAX_PATH_LEN: usize = 2048;
pub const MAX_REFERRER_LEN: usize = 2048;
pub const MAX_SCREEN_LEN: usize = 32;
pub const MAX_META_BYTES: usize = 4096;
/// 与 page_views.ip 列宽一致
pub const MAX_IP_LEN: usize = 64;

/// 客户端上报的访问信号
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// 由 HTTP 层提取的请求上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub ip: String,
    pub user_agent: Option<String>,
}

/// 被吞掉的错误计数
#[derive(Debug, Default)]
pub struct IngestCounters {
    pub accepted: AtomicU64,
    pub geo_timeouts: AtomicU64,
    pub geo_failures: AtomicU64,
    pub store_failures: AtomicU64,
    pub forwarded: AtomicU64,
    pub forward_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCountersSnapshot {
    pub accepted: u64,
    pub geo_timeouts: u64,
    pub geo_failures: u64,
    pub store_failures: u64,
    pub forwarded: u64,
    pub forward_failures: u64,
}

impl IngestCounters {
    pub fn snapshot(&self) -> IngestCountersSnapshot {
        IngestCountersSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            geo_timeouts: self.geo_timeouts.load(Ordering::Relaxed),
            geo_failures: self.geo_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
        }
    }
}

/// 截断到 `max` 个字符
fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// 一次采集的去向
#[derive(Debug, Clone, PartialEq)]
pub enum CollectOutcome {
    /// 已交给数据中心，本地不记录
    Forwarded,
    Recorded(PageView),
}

/// 地理位置富化结果
struct Location {
    city: String,
    country: String,
    isp: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl Location {
    fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            isp: UNKNOWN.to_string(),
            latitude: None,
            longitude: None,
        }
    }

    fn local() -> Self {
        Self {
            country: LOCALHOST.to_string(),
            ..Self::unknown()
        }
    }

    fn from_geo(info: GeoInfo) -> Self {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            city: or_unknown(info.city),
            country: or_unknown(info.country),
            isp: or_unknown(info.isp),
            latitude: info.lat.filter(|v| v.is_finite()),
            longitude: info.lon.filter(|v| v.is_finite()),
        }
    }
}

/// 采集服务
pub struct IngestService {
    store: Arc<dyn EventStore>,
    geo: Option<GeoIpProvider>,
    user_agents: Arc<dyn UserAgentParse>,
    ids: IdGenerator,
    /// 地理位置查询和转发共用
    upstream_timeout: Duration,
    forwarder: Option<(Arc<dyn EventForwarder>, String)>,
    counters: IngestCounters,
}

impl IngestService {
    /// `geo` 为 None 时不做地理位置查询（analytics.enable_geo_lookup = false）
    pub fn new(
        store: Arc<dyn EventStore>,
        geo: Option<GeoIpProvider>,
        user_agents: Arc<dyn UserAgentParse>,
        ids: IdGenerator,
        config: &AnalyticsConfig,
    ) -> Self {
        Self {
            store,
            geo,
            user_agents,
            ids,
            upstream_timeout: Duration::from_millis(config.geoip_timeout_ms.max(1)),
            forwarder: None,
            counters: IngestCounters::default(),
        }
    }

    /// 先转发到数据中心，`source` 写入转发请求体
    pub fn with_forwarder(
        mut self,
        forwarder: Arc<dyn EventForwarder>,
        source: impl Into<String>,
    ) -> Self {
        self.forwarder = Some((forwarder, source.into()));
        self
    }

    pub fn counters(&self) -> IngestCountersSnapshot {
        self.counters.snapshot()
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// 处理一次采集：配置了数据中心时先转发，失败再本地记录
    pub async fn collect(&self, raw: CollectRequest, ctx: RequestContext) -> CollectOutcome {
        if let Some((forwarder, source)) = &self.forwarder {
            let payload = tagged_payload(&raw, source);
            let result =
                match tokio::time::timeout(self.upstream_timeout, forwarder.forward(payload)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ForwardError::Timeout),
                };

            match result {
                Ok(()) => {
                    self.counters.forwarded.fetch_add(1, Ordering::Relaxed);
                    return CollectOutcome::Forwarded;
                }
                Err(e) => {
                    self.counters.forward_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "{} forward failed, recording locally: {}",
                        forwarder.name(),
                        e
                    );
                }
            }
        }

        CollectOutcome::Recorded(self.ingest(raw, ctx).await)
    }

    /// 富化并写入一条访问记录
    ///
    /// 返回构造出的记录；写入失败只记日志和计数，调用方照常返回成功
    pub async fn ingest(&self, raw: CollectRequest, ctx: RequestContext) -> PageView {
        let location = self.locate(&ctx.ip).await;
        let ua = self.user_agents.parse(ctx.user_agent.as_deref());

        let path = raw
            .path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("/");

        let meta = raw.meta.filter(|meta| {
            let size = meta.to_string().len();
            if size > MAX_META_BYTES {
                debug!("Dropping oversized meta ({} bytes) from {}", size, ctx.ip);
                false
            } else {
                true
            }
        });

        let (id, timestamp) = self.ids.next();
        let view = PageView {
            id,
            path: truncate_chars(path, MAX_PATH_LEN),
            referrer: truncate_chars(raw.referrer.as_deref().unwrap_or(""), MAX_REFERRER_LEN),
            screen: truncate_chars(raw.screen.as_deref().unwrap_or(""), MAX_SCREEN_LEN),
            ip: truncate_chars(&ctx.ip, MAX_IP_LEN),
            city: location.city,
            country: location.country,
            isp: location.isp,
            browser: ua.browser,
            browser_version: ua.browser_version,
            os: ua.os,
            os_version: ua.os_version,
            device_type: ua.device_type,
            latitude: location.latitude,
            longitude: location.longitude,
            meta,
            timestamp,
        };

        match self.store.insert(view.clone()).await {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                trace!("Stored page view {} for {}", view.id, view.path);
            }
            Err(e) => {
                self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                error!("Failed to store page view {}: {}", view.id, e);
            }
        }

        view
    }

    async fn locate(&self, ip: &str) -> Location {
        if should_skip_geolocation(ip) {
            return Location::local();
        }
        let Some(geo) = &self.geo else {
            return Location::unknown();
        };

        let result = match tokio::time::timeout(self.upstream_timeout, geo.lookup(ip)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout),
        };

        match result {
            Ok(info) => Location::from_geo(info),
            Err(GeoError::Timeout) => {
                self.counters.geo_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Geolocation for {} timed out after {:?} ({})",
                    ip,
                    self.upstream_timeout,
                    geo.provider_name()
                );
                Location::unknown()
            }
            Err(GeoError::NotFound) => {
                self.counters.geo_failures.fetch_add(1, Ordering::Relaxed);
                debug!("No geolocation for {}", ip);
                Location::unknown()
            }
            Err(e) => {
                self.counters.geo_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Geolocation for {} failed: {}", ip, e);
                Location::unknown()
            }
        }
    }
}
