//! 数据中心转发
//!
//! 配置 `analytics.data_hub_url` 后，采集信号先带上来源标记 POST 到中心实例；
//! 转发成功则本地不再记录，失败或超时回退到本地写入。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::ingest_service::CollectRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum ForwardError {
    Timeout,
    /// 中心实例返回了非 2xx
    Rejected(u16),
    Unavailable(String),
}

impl fmt::Display for ForwardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardError::Timeout => write!(f, "forward timed out"),
            ForwardError::Rejected(status) => write!(f, "data hub answered {}", status),
            ForwardError::Unavailable(msg) => write!(f, "data hub unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ForwardError {}

/// 采集信号转发 trait
#[async_trait]
pub trait EventForwarder: Send + Sync {
    async fn forward(&self, payload: serde_json::Value) -> Result<(), ForwardError>;

    /// 用于日志
    fn name(&self) -> &'static str;
}

/// 构造转发请求体：已解析的信号字段 + `source` 来源标记
pub fn tagged_payload(raw: &CollectRequest, source: &str) -> serde_json::Value {
    let mut payload = match serde_json::to_value(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    payload.insert(
        "source".to_string(),
        serde_json::Value::String(source.to_string()),
    );
    serde_json::Value::Object(payload)
}

/// 通过 HTTP POST JSON 转发到另一个 beacon 实例（或兼容端点）
pub struct DataHubForwarder {
    url: String,
    agent: Agent,
}

impl DataHubForwarder {
    pub fn new(url: &str, timeout_ms: u64) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(timeout_ms.max(1))))
            .build()
            .into();

        Self {
            url: url.to_string(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 同步发送，在 spawn_blocking 中调用
    fn post_sync(agent: &Agent, url: &str, payload: &serde_json::Value) -> Result<(), ForwardError> {
        match agent.post(url).send_json(payload) {
            Ok(_) => {
                trace!("Forwarded signal to {}", url);
                Ok(())
            }
            Err(ureq::Error::Timeout(_)) => Err(ForwardError::Timeout),
            Err(ureq::Error::StatusCode(status)) => Err(ForwardError::Rejected(status)),
            Err(other) => Err(ForwardError::Unavailable(other.to_string())),
        }
    }
}

#[async_trait]
impl EventForwarder for DataHubForwarder {
    async fn forward(&self, payload: serde_json::Value) -> Result<(), ForwardError> {
        let agent = self.agent.clone();
        let url = self.url.clone();

        tokio::task::spawn_blocking(move || Self::post_sync(&agent, &url, &payload))
            .await
            .unwrap_or_else(|e| {
                warn!("Forward spawn_blocking failed: {}", e);
                Err(ForwardError::Unavailable(e.to_string()))
            })
    }

    fn name(&self) -> &'static str {
        "DataHub"
    }
}
