//! 访问日志表迁移
//!
//! 创建 page_views 表，每条记录对应一次采集到的页面访问：
//! - 访问路径、来源、屏幕尺寸
//! - 客户端 IP 与地理位置 (city, country, isp, latitude, longitude)
//! - 解析后的 UserAgent 信息 (browser, os, device_type)
//! - 客户端附带的 meta JSON

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PageViews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PageViews::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PageViews::Path).text().not_null())
                    .col(ColumnDef::new(PageViews::Referrer).text().not_null())
                    .col(ColumnDef::new(PageViews::Screen).string_len(32).not_null())
                    .col(ColumnDef::new(PageViews::Ip).string_len(64).not_null())
                    .col(ColumnDef::new(PageViews::City).string_len(128).not_null())
                    .col(ColumnDef::new(PageViews::Country).string_len(128).not_null())
                    .col(ColumnDef::new(PageViews::Isp).string_len(255).not_null())
                    .col(ColumnDef::new(PageViews::Browser).string_len(64).not_null())
                    .col(
                        ColumnDef::new(PageViews::BrowserVersion)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PageViews::Os).string_len(64).not_null())
                    .col(ColumnDef::new(PageViews::OsVersion).string_len(64).not_null())
                    .col(ColumnDef::new(PageViews::DeviceType).string_len(32).not_null())
                    .col(ColumnDef::new(PageViews::Latitude).double().null())
                    .col(ColumnDef::new(PageViews::Longitude).double().null())
                    .col(ColumnDef::new(PageViews::Meta).text().null())
                    .col(
                        ColumnDef::new(PageViews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PageViews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum PageViews {
    #[sea_orm(iden = "page_views")]
    Table,
    Id,
    Path,
    Referrer,
    Screen,
    Ip,
    City,
    Country,
    Isp,
    Browser,
    BrowserVersion,
    Os,
    OsVersion,
    DeviceType,
    Latitude,
    Longitude,
    Meta,
    CreatedAt,
}
