//! 外部 GeoIP API 实现
//!
//! 使用外部 HTTP API 进行 IP 地理位置查询（默认 ip-api.com）
//! 内置缓存 + Singleflight 语义，只缓存成功结果

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoError, GeoInfo, GeoIpLookup};

/// GeoIP 缓存 TTL（15 分钟）
const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
/// GeoIP 缓存最大容量
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;

/// 外部 API GeoIP Provider
pub struct ExternalApiProvider {
    api_url_template: String,
    agent: Agent,
    /// IP → GeoInfo，失败不进缓存
    cache: Cache<String, GeoInfo>,
}

impl ExternalApiProvider {
    /// `api_url_template` 使用 `{ip}` 作为占位符
    pub fn new(api_url_template: &str, timeout_ms: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(timeout_ms.max(1))))
            .build()
            .into();

        Self {
            api_url_template: api_url_template.to_string(),
            agent,
            cache,
        }
    }

    /// 从外部 API 获取 GeoIP 信息（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(agent: &Agent, url: &str) -> Result<GeoInfo, GeoError> {
        let resp = agent.get(url).call().map_err(|e| match e {
            ureq::Error::Timeout(_) => GeoError::Timeout,
            other => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, other);
                GeoError::Unavailable(other.to_string())
            }
        })?;

        let json: serde_json::Value = resp.into_body().read_json().map_err(|e| {
            warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
            GeoError::Unavailable(format!("invalid response: {}", e))
        })?;

        parse_response(&json)
    }

    async fn fetch_from_api(&self, ip: &str) -> Result<GeoInfo, GeoError> {
        let url = self.api_url_template.replace("{ip}", ip);
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(&agent, &url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                Err(GeoError::Unavailable(e.to_string()))
            })
    }
}

/// 解析 ip-api.com 风格的响应
///
/// 成功: `{"status":"success","country":"France","city":"Paris","isp":"Orange","lat":48.85,"lon":2.35}`
/// 失败: `{"status":"fail","message":"private range"}`
pub(super) fn parse_response(json: &serde_json::Value) -> Result<GeoInfo, GeoError> {
    if json["status"].as_str() == Some("fail") {
        trace!(
            "External API returned fail status: {:?}",
            json["message"].as_str()
        );
        return Err(GeoError::NotFound);
    }

    let text = |key: &str| {
        json[key]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let info = GeoInfo {
        city: text("city"),
        country: text("country").or_else(|| text("country_name")),
        isp: text("isp").or_else(|| text("org")),
        lat: json["lat"].as_f64().or_else(|| json["latitude"].as_f64()),
        lon: json["lon"].as_f64().or_else(|| json["longitude"].as_f64()),
    };

    trace!("External API lookup: {:?}", info);
    Ok(info)
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    /// 同一 IP 的并发请求只发一次 HTTP；失败结果不缓存，下次重新请求
    async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError> {
        self.cache
            .try_get_with(ip.to_string(), async {
                trace!("GeoIP cache miss for {}, fetching from API", ip);
                self.fetch_from_api(ip).await
            })
            .await
            .map_err(|e: Arc<GeoError>| (*e).clone())
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
