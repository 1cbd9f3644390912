//! page_views 聚合查询索引
//!
//! - idx_page_views_city: city + country（热门城市）
//! - idx_page_views_isp: isp（热门 ISP）
//! - idx_page_views_browser: browser（浏览器分布）
//! - idx_page_views_geo_point: latitude + longitude（地图点位）

use sea_orm_migration::prelude::*;

use crate::m20260301_000001_page_views::PageViews;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_city")
                    .table(PageViews::Table)
                    .col(PageViews::City)
                    .col(PageViews::Country)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_isp")
                    .table(PageViews::Table)
                    .col(PageViews::Isp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_browser")
                    .table(PageViews::Table)
                    .col(PageViews::Browser)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_page_views_geo_point")
                    .table(PageViews::Table)
                    .col(PageViews::Latitude)
                    .col(PageViews::Longitude)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_page_views_geo_point",
            "idx_page_views_browser",
            "idx_page_views_isp",
            "idx_page_views_city",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(PageViews::Table).to_owned())
                .await?;
        }
        Ok(())
    }
}
