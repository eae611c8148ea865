//! Migration to create the five seasonal rate tables.
//!
//! Every rate table shares the same tenant/offering/season/currency skeleton and only
//! differs in its price columns, so the skeleton is built once by `rate_table`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const RATE_TABLES: [&str; 5] = [
    "hotel_room_rates",
    "transfer_rates",
    "vehicle_rates",
    "guide_rates",
    "activity_rates",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut hotel = rate_table("hotel_room_rates");
        hotel
            .col(
                ColumnDef::new(RateColumns::BoardType)
                    .text()
                    .not_null()
                    .default("BB"),
            )
            .col(money(RateColumns::PriceSingle).not_null())
            .col(money(RateColumns::PriceDouble).not_null())
            .col(money(RateColumns::PriceTriple).null());
        manager.create_table(hotel).await?;

        let mut transfer = rate_table("transfer_rates");
        transfer
            .col(money(RateColumns::PricePerVehicle).not_null())
            .col(
                ColumnDef::new(RateColumns::VehicleCapacity)
                    .integer()
                    .not_null()
                    .default(1),
            );
        manager.create_table(transfer).await?;

        let mut vehicle = rate_table("vehicle_rates");
        vehicle
            .col(money(RateColumns::DailyRate).not_null())
            .col(money(RateColumns::HalfDayRate).null());
        manager.create_table(vehicle).await?;

        let mut guide = rate_table("guide_rates");
        guide
            .col(money(RateColumns::DailyRate).not_null())
            .col(ColumnDef::new(RateColumns::Language).text().null());
        manager.create_table(guide).await?;

        let mut activity = rate_table("activity_rates");
        activity
            .col(money(RateColumns::AdultPrice).not_null())
            .col(money(RateColumns::ChildPrice).null());
        manager.create_table(activity).await?;

        for table in RATE_TABLES {
            manager
                .create_index(
                    Index::create()
                        .name(format!("idx_{table}_tenant_offering_season"))
                        .table(Alias::new(table))
                        .col(RateColumns::TenantId)
                        .col(RateColumns::ServiceOfferingId)
                        .col(RateColumns::SeasonFrom)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in RATE_TABLES {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}

fn money(column: RateColumns) -> ColumnDef {
    let mut def = ColumnDef::new(column);
    def.decimal_len(14, 2);
    def
}

fn rate_table(name: &str) -> TableCreateStatement {
    let table = Alias::new(name);
    Table::create()
        .table(table.clone())
        .if_not_exists()
        .col(
            ColumnDef::new(RateColumns::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(RateColumns::TenantId).uuid().not_null())
        .col(
            ColumnDef::new(RateColumns::ServiceOfferingId)
                .uuid()
                .not_null(),
        )
        .col(ColumnDef::new(RateColumns::SeasonFrom).date().not_null())
        .col(ColumnDef::new(RateColumns::SeasonTo).date().not_null())
        .col(
            ColumnDef::new(RateColumns::Currency)
                .text()
                .not_null()
                .default("EUR"),
        )
        .col(
            ColumnDef::new(RateColumns::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(RateColumns::CreatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(RateColumns::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_tenant_id"))
                .from(table.clone(), RateColumns::TenantId)
                .to(Tenants::Table, Tenants::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{name}_service_offering_id"))
                .from(table, RateColumns::ServiceOfferingId)
                .to(ServiceOfferings::Table, ServiceOfferings::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum RateColumns {
    Id,
    TenantId,
    ServiceOfferingId,
    SeasonFrom,
    SeasonTo,
    Currency,
    IsActive,
    CreatedAt,
    UpdatedAt,
    BoardType,
    PriceSingle,
    PriceDouble,
    PriceTriple,
    PricePerVehicle,
    VehicleCapacity,
    DailyRate,
    HalfDayRate,
    Language,
    AdultPrice,
    ChildPrice,
}

#[derive(DeriveIden)]
enum ServiceOfferings {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
