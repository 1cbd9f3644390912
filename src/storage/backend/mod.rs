//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{BeaconError, Result};
use crate::storage::models::{AggregateStats, GroupCount, GroupField, MapPoint, PageView};
use crate::storage::traits::EventStore;

use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<&'static str> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite")
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(BeaconError::config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: &'static str,
    /// None 表示不限条数
    retention_cap: Option<usize>,
}

impl SeaOrmStore {
    pub async fn new(config: &DatabaseConfig, retention_cap: Option<usize>) -> Result<Self> {
        let database_url = config.database_url.as_str();
        if database_url.is_empty() {
            return Err(BeaconError::config("DATABASE_URL 未设置"));
        }

        let backend_name = infer_backend_from_url(database_url)?;
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config).await?
        };

        run_migrations(&db).await?;

        warn!(
            "{} storage initialized (retention cap: {})",
            backend_name.to_uppercase(),
            retention_cap.map_or_else(|| "unbounded".to_string(), |c| c.to_string())
        );

        Ok(SeaOrmStore {
            db,
            backend_name,
            retention_cap: retention_cap.filter(|c| *c > 0),
        })
    }
}

#[async_trait]
impl EventStore for SeaOrmStore {
    async fn insert(&self, view: PageView) -> Result<()> {
        self.insert_view(&view).await
    }

    async fn query(&self, filter: Option<&str>, limit: usize) -> Result<Vec<PageView>> {
        self.query_recent(filter, limit).await
    }

    async fn count_grouped_by(&self, field: GroupField, limit: usize) -> Result<Vec<GroupCount>> {
        self.query_grouped(field, limit).await
    }

    async fn map_points(&self) -> Result<Vec<MapPoint>> {
        self.query_map_points().await
    }

    async fn stats(&self) -> Result<AggregateStats> {
        self.query_stats().await
    }

    async fn delete_by_ids(&self, ids: &HashSet<i64>) -> Result<u64> {
        self.delete_ids(ids).await
    }

    async fn delete_all(&self) -> Result<u64> {
        self.delete_everything().await
    }

    async fn last_id(&self) -> Result<Option<i64>> {
        self.query_last_id().await
    }

    async fn health_check(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}
