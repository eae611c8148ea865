use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExchangeRates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExchangeRates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExchangeRates::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ExchangeRates::FromCurrency).text().not_null())
                    .col(ColumnDef::new(ExchangeRates::ToCurrency).text().not_null())
                    .col(
                        ColumnDef::new(ExchangeRates::Rate)
                            .decimal_len(16, 6)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExchangeRates::EffectiveDate).date().not_null())
                    .col(
                        ColumnDef::new(ExchangeRates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ExchangeRates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exchange_rates_tenant_id")
                            .from(ExchangeRates::Table, ExchangeRates::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Acceptance resolves the latest rate on or before a date for a pair.
        manager
            .create_index(
                Index::create()
                    .name("idx_exchange_rates_pair_effective_date")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::TenantId)
                    .col(ExchangeRates::FromCurrency)
                    .col(ExchangeRates::ToCurrency)
                    .col(ExchangeRates::EffectiveDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExchangeRates {
    Table,
    Id,
    TenantId,
    FromCurrency,
    ToCurrency,
    Rate,
    EffectiveDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
