//! 过滤用的小写文本列
//!
//! SQLite 的 LOWER() 只处理 ASCII，非 ASCII 的城市名（如 "ÅRHUS"）无法大小写不敏感匹配。
//! 写入时由应用层生成小写文本存入 search_text，过滤只对这一列做 LIKE。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PageViews::Table)
                    .add_column(
                        ColumnDef::new(PageViews::SearchText)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        // 回填已有记录；数据库端 LOWER 只保证 ASCII，新记录由应用层完整小写
        let separator = if manager.get_database_backend() == DatabaseBackend::Postgres {
            "chr(31)"
        } else {
            "char(31)"
        };
        let backfill = format!(
            "UPDATE page_views SET search_text = LOWER(path || {sep} || city || {sep} || country || {sep} || ip || {sep} || browser || {sep} || os)",
            sep = separator
        );
        manager
            .get_connection()
            .execute_unprepared(&backfill)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PageViews::Table)
                    .drop_column(PageViews::SearchText)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum PageViews {
    #[sea_orm(iden = "page_views")]
    Table,
    SearchText,
}
