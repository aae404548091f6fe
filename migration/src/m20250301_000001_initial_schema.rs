use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sessions table (rows are issued by the login service)
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::SessionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Sessions::Subject))
                    .col(big_integer(Sessions::CreatedAt))
                    .col(big_integer(Sessions::ExpiresAt))
                    .to_owned(),
            )
            .await?;

        // Create properties table
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(Properties::Owner))
                    .col(string(Properties::Name))
                    .col(string(Properties::PropertyType))
                    .col(text(Properties::Description))
                    .col(string(Properties::Street))
                    .col(string(Properties::City))
                    .col(string(Properties::State))
                    .col(string(Properties::Zipcode))
                    // Measures are nullable: NaN is stored as NULL
                    .col(double_null(Properties::Beds))
                    .col(double_null(Properties::Baths))
                    .col(double_null(Properties::SquareFeet))
                    .col(text(Properties::Amenities))
                    .col(double_null(Properties::RateNightly))
                    .col(double_null(Properties::RateWeekly))
                    .col(double_null(Properties::RateMonthly))
                    .col(string(Properties::SellerName))
                    .col(string(Properties::SellerEmail))
                    .col(string(Properties::SellerPhone))
                    .col(text(Properties::Images))
                    .col(big_integer(Properties::CreatedAt))
                    .col(big_integer(Properties::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    SessionId,
    Subject,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
pub(crate) enum Properties {
    Table,
    Id,
    Owner,
    Name,
    PropertyType,
    Description,
    Street,
    City,
    State,
    Zipcode,
    Beds,
    Baths,
    SquareFeet,
    Amenities,
    RateNightly,
    RateWeekly,
    RateMonthly,
    SellerName,
    SellerEmail,
    SellerPhone,
    Images,
    CreatedAt,
    UpdatedAt,
}
