//! Query operations for SeaOrmStore
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, LikeExpr},
};
use tracing::debug;

use super::SeaOrmStore;
use super::converters::model_to_page_view;
use crate::errors::Result;
use crate::storage::models::{
    AggregateStats, GroupCount, GroupField, LOCALHOST, MapPoint, PageView, UNKNOWN,
};
use crate::utils::ip::UNKNOWN_IP;

use migration::entities::page_view;

/// 汇总统计结果
#[derive(Debug, FromQueryResult)]
struct StatsRow {
    total_views: i64,
    unique_visitors: i64,
    active_countries: i64,
}

/// 单列分组结果（isp / browser）
#[derive(Debug, FromQueryResult)]
struct GroupRow {
    key: String,
    count: i64,
}

/// city + country 分组结果
#[derive(Debug, FromQueryResult)]
struct CityRow {
    key: String,
    country: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct MapRow {
    lat: f64,
    lon: f64,
    city: String,
    country: String,
    count: i64,
}

/// LIKE 转义字符；不用反斜杠，各数据库的字符串转义规则不一致
const LIKE_ESCAPE: char = '!';

/// 转义 LIKE 通配符
fn like_pattern(needle: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape(LIKE_ESCAPE)
}

/// search_text 包含 needle（两者都已在应用层小写）
fn filter_condition(needle: &str) -> Condition {
    Condition::all().add(page_view::Column::SearchText.like(like_pattern(needle)))
}

impl SeaOrmStore {
    pub(super) async fn query_recent(
        &self,
        filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PageView>> {
        let mut select = page_view::Entity::find();
        if let Some(needle) = filter {
            select = select.filter(filter_condition(needle));
        }

        let models = select
            .order_by_desc(page_view::Column::Id)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        debug!("Loaded {} page views (filter: {:?})", models.len(), filter);
        Ok(models.into_iter().map(model_to_page_view).collect())
    }

    pub(super) async fn query_grouped(
        &self,
        field: GroupField,
        limit: usize,
    ) -> Result<Vec<GroupCount>> {
        if field == GroupField::CityCountry {
            let rows = page_view::Entity::find()
                .select_only()
                .column_as(page_view::Column::City, "key")
                .column_as(page_view::Column::Country, "country")
                .column_as(page_view::Column::Id.count(), "count")
                .filter(page_view::Column::City.ne(UNKNOWN))
                .filter(page_view::Column::City.ne(""))
                .group_by(page_view::Column::City)
                .group_by(page_view::Column::Country)
                .order_by_desc(Expr::cust("count"))
                .order_by_asc(page_view::Column::Id.min())
                .limit(limit as u64)
                .into_model::<CityRow>()
                .all(&self.db)
                .await?;

            return Ok(rows
                .into_iter()
                .map(|r| GroupCount {
                    key: r.key,
                    country: Some(r.country),
                    count: r.count.max(0) as u64,
                })
                .collect());
        }

        let column = match field {
            GroupField::Isp => page_view::Column::Isp,
            _ => page_view::Column::Browser,
        };

        let rows = page_view::Entity::find()
            .select_only()
            .column_as(column, "key")
            .column_as(page_view::Column::Id.count(), "count")
            .filter(column.ne(UNKNOWN))
            .filter(column.ne(""))
            .group_by(column)
            .order_by_desc(Expr::cust("count"))
            .order_by_asc(page_view::Column::Id.min())
            .limit(limit as u64)
            .into_model::<GroupRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupCount {
                key: r.key,
                country: None,
                count: r.count.max(0) as u64,
            })
            .collect())
    }

    pub(super) async fn query_map_points(&self) -> Result<Vec<MapPoint>> {
        let rows = page_view::Entity::find()
            .select_only()
            .column_as(page_view::Column::Latitude, "lat")
            .column_as(page_view::Column::Longitude, "lon")
            .column_as(page_view::Column::City.min(), "city")
            .column_as(page_view::Column::Country.min(), "country")
            .column_as(page_view::Column::Id.count(), "count")
            .filter(page_view::Column::Latitude.is_not_null())
            .filter(page_view::Column::Longitude.is_not_null())
            .group_by(page_view::Column::Latitude)
            .group_by(page_view::Column::Longitude)
            .order_by_desc(Expr::cust("count"))
            .order_by_asc(page_view::Column::Id.min())
            .into_model::<MapRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| MapPoint {
                lat: r.lat,
                lon: r.lon,
                city: r.city,
                country: r.country,
                count: r.count.max(0) as u64,
            })
            .collect())
    }

    pub(super) async fn query_stats(&self) -> Result<AggregateStats> {
        let unique_visitors = format!(
            "COUNT(DISTINCT CASE WHEN ip <> '{}' THEN ip END)",
            UNKNOWN_IP
        );
        let active_countries = format!(
            "COUNT(DISTINCT CASE WHEN country NOT IN ('{}', '{}', '') THEN country END)",
            UNKNOWN, LOCALHOST
        );

        let row = page_view::Entity::find()
            .select_only()
            .column_as(page_view::Column::Id.count(), "total_views")
            .column_as(Expr::cust(unique_visitors), "unique_visitors")
            .column_as(Expr::cust(active_countries), "active_countries")
            .into_model::<StatsRow>()
            .one(&self.db)
            .await?;

        Ok(row
            .map(|r| AggregateStats {
                total_views: r.total_views.max(0) as u64,
                unique_visitors: r.unique_visitors.max(0) as u64,
                active_countries: r.active_countries.max(0) as u64,
            })
            .unwrap_or_default())
    }

    pub(super) async fn query_last_id(&self) -> Result<Option<i64>> {
        let max = page_view::Entity::find()
            .select_only()
            .column_as(page_view::Column::Id.max(), "max_id")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await?;
        Ok(max.flatten())
    }
}
