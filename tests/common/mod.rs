//! 集成测试共用的桩实现与数据构造
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use beacon::config::{DatabaseConfig, StaticConfig};
use beacon::errors::{BeaconError, Result};
use beacon::services::{EventForwarder, ForwardError, GeoError, GeoInfo, GeoIpLookup};
use beacon::storage::{
    AggregateStats, EventStore, GroupCount, GroupField, MapPoint, PageView, SeaOrmStore, UNKNOWN,
};

pub const SECRET: &str = "s3cret";

/// 构造一条访问记录
pub fn view(id: i64, path: &str) -> PageView {
    PageView {
        id,
        path: path.to_string(),
        referrer: String::new(),
        screen: "1280x720".to_string(),
        ip: format!("198.51.100.{}", id % 250),
        city: UNKNOWN.to_string(),
        country: UNKNOWN.to_string(),
        isp: UNKNOWN.to_string(),
        browser: UNKNOWN.to_string(),
        browser_version: String::new(),
        os: UNKNOWN.to_string(),
        os_version: String::new(),
        device_type: UNKNOWN.to_string(),
        latitude: None,
        longitude: None,
        meta: None,
        timestamp: DateTime::from_timestamp(1_700_000_000 + id, 0).unwrap_or_else(Utc::now),
    }
}

pub fn located(id: i64, city: &str, country: &str) -> PageView {
    let mut v = view(id, "/");
    v.city = city.to_string();
    v.country = country.to_string();
    v
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.admin.secret = SECRET.to_string();
    config.analytics.geoip_timeout_ms = 100;
    config
}

/// 临时 SQLite 存储，TempDir 需与存储同生命周期
pub async fn sqlite_store(cap: Option<usize>) -> (Arc<dyn EventStore>, TempDir) {
    let td = TempDir::new().unwrap();
    let p = td.path().join("beacon_test.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", p.display()),
        ..Default::default()
    };
    let store = SeaOrmStore::new(&config, cap).await.unwrap();
    (Arc::new(store), td)
}

// =============================================================================
// GeoIP 桩
// =============================================================================

#[derive(Clone)]
pub enum GeoBehavior {
    Found(GeoInfo),
    Down,
    Slow(Duration),
}

/// 记录调用次数的 GeoIP 桩
pub struct MockGeo {
    pub calls: AtomicUsize,
    behavior: GeoBehavior,
}

impl MockGeo {
    pub fn new(behavior: GeoBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior,
        })
    }

    pub fn paris() -> Arc<Self> {
        Self::new(GeoBehavior::Found(GeoInfo {
            city: Some("Paris".to_string()),
            country: Some("France".to_string()),
            isp: Some("Orange".to_string()),
            lat: Some(48.8566),
            lon: Some(2.3522),
        }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoIpLookup for MockGeo {
    async fn lookup(&self, _ip: &str) -> std::result::Result<GeoInfo, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            GeoBehavior::Found(info) => Ok(info.clone()),
            GeoBehavior::Down => Err(GeoError::Unavailable("connection refused".to_string())),
            GeoBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(GeoInfo::default())
            }
        }
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

// =============================================================================
// 转发桩
// =============================================================================

#[derive(Clone)]
pub enum ForwardBehavior {
    Accept,
    Reject(u16),
    Slow(Duration),
}

/// 记录收到的请求体的转发桩
pub struct MockForwarder {
    pub received: parking_lot::Mutex<Vec<serde_json::Value>>,
    behavior: ForwardBehavior,
}

impl MockForwarder {
    pub fn new(behavior: ForwardBehavior) -> Arc<Self> {
        Arc::new(Self {
            received: parking_lot::Mutex::new(Vec::new()),
            behavior,
        })
    }

    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl EventForwarder for MockForwarder {
    async fn forward(&self, payload: serde_json::Value) -> std::result::Result<(), ForwardError> {
        self.received.lock().push(payload);
        match &self.behavior {
            ForwardBehavior::Accept => Ok(()),
            ForwardBehavior::Reject(status) => Err(ForwardError::Rejected(*status)),
            ForwardBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "MockHub"
    }
}

// =============================================================================
// 总是失败的存储
// =============================================================================

pub struct FailingStore;

fn down<T>() -> Result<T> {
    Err(BeaconError::storage_unavailable("database is down"))
}

#[async_trait]
impl EventStore for FailingStore {
    async fn insert(&self, _view: PageView) -> Result<()> {
        down()
    }

    async fn query(&self, _filter: Option<&str>, _limit: usize) -> Result<Vec<PageView>> {
        down()
    }

    async fn count_grouped_by(&self, _field: GroupField, _limit: usize) -> Result<Vec<GroupCount>> {
        down()
    }

    async fn map_points(&self) -> Result<Vec<MapPoint>> {
        down()
    }

    async fn stats(&self) -> Result<AggregateStats> {
        down()
    }

    async fn delete_by_ids(&self, _ids: &HashSet<i64>) -> Result<u64> {
        down()
    }

    async fn delete_all(&self) -> Result<u64> {
        down()
    }

    async fn last_id(&self) -> Result<Option<i64>> {
        down()
    }

    async fn health_check(&self) -> Result<()> {
        down()
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
