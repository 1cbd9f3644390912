pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_page_views;
mod m20260301_000002_page_view_indexes;
mod m20260302_000001_page_view_search_text;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_page_views::Migration),
            Box::new(m20260301_000002_page_view_indexes::Migration),
            Box::new(m20260302_000001_page_view_search_text::Migration),
        ]
    }
}
