use sea_orm_migration::prelude::*;

use crate::m20250301_000001_initial_schema::Properties;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Profile listings are always loaded by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_properties_owner")
                    .table(Properties::Table)
                    .col(Properties::Owner)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_properties_owner")
                    .table(Properties::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
