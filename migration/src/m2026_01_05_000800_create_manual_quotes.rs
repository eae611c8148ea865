//! Migration to create manual quotes with their day plan and expense lines.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ManualQuotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManualQuotes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ManualQuotes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ManualQuotes::ClientId).uuid().null())
                    .col(ColumnDef::new(ManualQuotes::Title).text().not_null())
                    .col(
                        ColumnDef::new(ManualQuotes::Currency)
                            .text()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(ManualQuotes::MarkupPercent)
                            .decimal_len(7, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ManualQuotes::TaxPercent)
                            .decimal_len(7, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ManualQuotes::TransportPricing)
                            .text()
                            .not_null()
                            .default("PER_PERSON"),
                    )
                    .col(ColumnDef::new(ManualQuotes::PricingTable).json_binary().null())
                    .col(
                        ColumnDef::new(ManualQuotes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ManualQuotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ManualQuotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_quotes_tenant_id")
                            .from(ManualQuotes::Table, ManualQuotes::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_quotes_client_id")
                            .from(ManualQuotes::Table, ManualQuotes::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ManualQuoteDays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManualQuoteDays::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ManualQuoteDays::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(ManualQuoteDays::ManualQuoteId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ManualQuoteDays::DayNumber).integer().not_null())
                    .col(ColumnDef::new(ManualQuoteDays::Date).date().null())
                    .col(ColumnDef::new(ManualQuoteDays::Title).text().not_null())
                    .col(
                        ColumnDef::new(ManualQuoteDays::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ManualQuoteDays::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_quote_days_quote_id")
                            .from(ManualQuoteDays::Table, ManualQuoteDays::ManualQuoteId)
                            .to(ManualQuotes::Table, ManualQuotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ManualQuoteExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ManualQuoteExpenses::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::ManualQuoteId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::ManualQuoteDayId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ManualQuoteExpenses::Category).text().not_null())
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::Price)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ManualQuoteExpenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_quote_expenses_quote_id")
                            .from(
                                ManualQuoteExpenses::Table,
                                ManualQuoteExpenses::ManualQuoteId,
                            )
                            .to(ManualQuotes::Table, ManualQuotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_manual_quote_expenses_day_id")
                            .from(
                                ManualQuoteExpenses::Table,
                                ManualQuoteExpenses::ManualQuoteDayId,
                            )
                            .to(ManualQuoteDays::Table, ManualQuoteDays::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_manual_quote_expenses_quote_id")
                    .table(ManualQuoteExpenses::Table)
                    .col(ManualQuoteExpenses::ManualQuoteId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ManualQuoteExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ManualQuoteDays::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ManualQuotes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ManualQuotes {
    Table,
    Id,
    TenantId,
    ClientId,
    Title,
    Currency,
    MarkupPercent,
    TaxPercent,
    TransportPricing,
    PricingTable,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ManualQuoteDays {
    Table,
    Id,
    TenantId,
    ManualQuoteId,
    DayNumber,
    Date,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ManualQuoteExpenses {
    Table,
    Id,
    TenantId,
    ManualQuoteId,
    ManualQuoteDayId,
    Category,
    Description,
    Price,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
