//! Page view entity, one row per collected signal

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "page_views")]
pub struct Model {
    /// 由 IdGenerator 分配，单调递增（非自增列）
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    #[sea_orm(column_type = "Text")]
    pub path: String,
    #[sea_orm(column_type = "Text")]
    pub referrer: String,
    pub screen: String,
    pub ip: String,
    pub city: String,
    pub country: String,
    pub isp: String,
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Client supplied JSON, stored verbatim
    #[sea_orm(column_type = "Text", nullable)]
    pub meta: Option<String>,
    pub created_at: DateTimeUtc,
    /// 小写后的 path / city / country / ip / browser / os，只用于过滤
    #[sea_orm(column_type = "Text")]
    pub search_text: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
