//! Dashboard service layer
//!
//! 管理端查询与删除，全部受 admin secret 保护（`get_public_stats` 除外）

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{BeaconError, Result};
use crate::services::ingest_service::{IngestCountersSnapshot, IngestService};
use crate::storage::{
    AggregateStats, EventStore, GroupCount, GroupField, MapPoint, PageView, normalize_filter,
};

/// Dashboard 各榜单长度
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IspCount {
    pub isp: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowserCount {
    pub browser: String,
    pub count: u64,
}

/// Dashboard 聚合数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: AggregateStats,
    pub top_cities: Vec<CityCount>,
    pub top_isps: Vec<IspCount>,
    pub top_browsers: Vec<BrowserCount>,
    pub recent_logs: Vec<PageView>,
    pub map_points: Vec<MapPoint>,
}

/// 删除请求：`{ids: [...]}` 或 `{all: true}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteLogsRequest {
    #[serde(default)]
    pub ids: Option<Vec<i64>>,
    #[serde(default)]
    pub all: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublicStats {
    pub visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub backend: &'static str,
    pub ingest: IngestCountersSnapshot,
}

/// 经过校验的删除目标
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeleteTarget {
    Ids(HashSet<i64>),
    All,
}

impl DeleteLogsRequest {
    fn target(self) -> Result<DeleteTarget> {
        match (self.ids, self.all) {
            (_, Some(true)) => Ok(DeleteTarget::All),
            (Some(ids), _) if !ids.is_empty() => Ok(DeleteTarget::Ids(ids.into_iter().collect())),
            (Some(_), _) => Err(BeaconError::validation("ids must not be empty")),
            (None, _) => Err(BeaconError::validation(
                "request must contain either ids or all: true",
            )),
        }
    }
}

fn city_rows(rows: Vec<GroupCount>) -> Vec<CityCount> {
    rows.into_iter()
        .map(|r| CityCount {
            city: r.key,
            country: r.country.unwrap_or_default(),
            count: r.count,
        })
        .collect()
}

/// Dashboard 查询服务
///
/// 认证方式是单一静态口令：token 就是口令本身，没有会话也不会过期，只适合低风险部署。
pub struct DashboardService {
    store: Arc<dyn EventStore>,
    ingest: Arc<IngestService>,
    secret: String,
    page_size: usize,
}

impl DashboardService {
    pub fn new(
        store: Arc<dyn EventStore>,
        ingest: Arc<IngestService>,
        secret: impl Into<String>,
        page_size: usize,
    ) -> Self {
        let secret = secret.into();
        if secret.is_empty() {
            warn!("Admin secret is empty, admin API is disabled");
        }
        Self {
            store,
            ingest,
            secret,
            page_size: page_size.max(1),
        }
    }

    /// 严格、大小写敏感比较；未配置口令时一律拒绝
    pub fn authenticate(&self, secret: &str) -> bool {
        !self.secret.is_empty() && self.secret == secret
    }

    fn require_auth(&self, secret: &str) -> Result<()> {
        if self.authenticate(secret) {
            Ok(())
        } else {
            Err(BeaconError::unauthorized("invalid admin secret"))
        }
    }

    pub async fn get_dashboard(&self, filter: Option<&str>, secret: &str) -> Result<Dashboard> {
        self.require_auth(secret)?;
        let filter = normalize_filter(filter);

        let (stats, cities, isps, browsers, recent_logs, map_points) = tokio::try_join!(
            self.store.stats(),
            self.store.count_grouped_by(GroupField::CityCountry, TOP_N),
            self.store.count_grouped_by(GroupField::Isp, TOP_N),
            self.store.count_grouped_by(GroupField::Browser, TOP_N),
            self.store.query(filter.as_deref(), self.page_size),
            self.store.map_points(),
        )?;

        Ok(Dashboard {
            stats,
            top_cities: city_rows(cities),
            top_isps: isps
                .into_iter()
                .map(|r| IspCount {
                    isp: r.key,
                    count: r.count,
                })
                .collect(),
            top_browsers: browsers
                .into_iter()
                .map(|r| BrowserCount {
                    browser: r.key,
                    count: r.count,
                })
                .collect(),
            recent_logs,
            map_points,
        })
    }

    pub async fn delete_logs(
        &self,
        request: DeleteLogsRequest,
        secret: &str,
    ) -> Result<DeleteOutcome> {
        self.require_auth(secret)?;

        let deleted = match request.target()? {
            DeleteTarget::All => self.store.delete_all().await?,
            DeleteTarget::Ids(ids) => self.store.delete_by_ids(&ids).await?,
        };

        info!("Admin deleted {} page views", deleted);
        Ok(DeleteOutcome { deleted })
    }

    pub async fn get_public_stats(&self) -> Result<PublicStats> {
        let stats = self.store.stats().await?;
        Ok(PublicStats {
            visits: stats.total_views,
        })
    }

    pub fn diagnostics(&self, secret: &str) -> Result<Diagnostics> {
        self.require_auth(secret)?;
        Ok(Diagnostics {
            backend: self.store.backend_name(),
            ingest: self.ingest.counters(),
        })
    }
}
