//! Mutation operations for SeaOrmStore
//!
//! This module contains all write database operations.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{debug, info};

use super::SeaOrmStore;
use super::converters::page_view_to_active_model;
use crate::errors::Result;
use crate::storage::PageView;

use migration::entities::page_view;

impl SeaOrmStore {
    pub(super) async fn insert_view(&self, view: &PageView) -> Result<()> {
        page_view::Entity::insert(page_view_to_active_model(view))
            .exec_without_returning(&self.db)
            .await?;

        if let Some(cap) = self.retention_cap {
            self.enforce_retention(cap).await?;
        }
        Ok(())
    }

    /// 只保留最新的 `cap` 条
    async fn enforce_retention(&self, cap: usize) -> Result<()> {
        let threshold = page_view::Entity::find()
            .select_only()
            .column(page_view::Column::Id)
            .order_by_desc(page_view::Column::Id)
            .offset(cap as u64)
            .limit(1)
            .into_tuple::<i64>()
            .one(&self.db)
            .await?;

        if let Some(threshold) = threshold {
            let result = page_view::Entity::delete_many()
                .filter(page_view::Column::Id.lte(threshold))
                .exec(&self.db)
                .await?;
            debug!(
                "Retention cap {} evicted {} page views",
                cap, result.rows_affected
            );
        }
        Ok(())
    }

    pub(super) async fn delete_ids(&self, ids: &HashSet<i64>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = page_view::Entity::delete_many()
            .filter(page_view::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await?;

        info!(
            "Deleted {} of {} requested page views",
            result.rows_affected,
            ids.len()
        );
        Ok(result.rows_affected)
    }

    pub(super) async fn delete_everything(&self) -> Result<u64> {
        let result = page_view::Entity::delete_many().exec(&self.db).await?;
        info!("Deleted all {} page views", result.rows_affected);
        Ok(result.rows_affected)
    }
}
