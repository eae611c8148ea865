//! Migration to create the quotations, bookings and booking_items tables.
//!
//! Booking codes are unique per tenant; the acceptance workflow relies on that index
//! to turn a concurrent duplicate code into a conflict.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quotations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Quotations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Quotations::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Quotations::ClientId).uuid().null())
                    .col(ColumnDef::new(Quotations::Title).text().not_null())
                    .col(
                        ColumnDef::new(Quotations::Status)
                            .text()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(
                        ColumnDef::new(Quotations::Currency)
                            .text()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Quotations::Items).json_binary().not_null())
                    .col(
                        ColumnDef::new(Quotations::TotalPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Quotations::TravelStart).date().null())
                    .col(ColumnDef::new(Quotations::TravelEnd).date().null())
                    .col(
                        ColumnDef::new(Quotations::SentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Quotations::AcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Quotations::RejectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Quotations::RejectionReason).text().null())
                    .col(
                        ColumnDef::new(Quotations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Quotations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotations_tenant_id")
                            .from(Quotations::Table, Quotations::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotations_client_id")
                            .from(Quotations::Table, Quotations::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::BookingCode).text().not_null())
                    .col(ColumnDef::new(Bookings::QuotationId).uuid().null())
                    .col(ColumnDef::new(Bookings::ClientId).uuid().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .text()
                            .not_null()
                            .default("CONFIRMED"),
                    )
                    .col(ColumnDef::new(Bookings::StartDate).date().null())
                    .col(ColumnDef::new(Bookings::EndDate).date().null())
                    .col(
                        ColumnDef::new(Bookings::TotalPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Currency).text().not_null())
                    .col(
                        ColumnDef::new(Bookings::LockedExchangeRate)
                            .decimal_len(16, 6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_tenant_id")
                            .from(Bookings::Table, Bookings::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_quotation_id")
                            .from(Bookings::Table, Bookings::QuotationId)
                            .to(Quotations::Table, Quotations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_client_id")
                            .from(Bookings::Table, Bookings::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_tenant_booking_code")
                    .table(Bookings::Table)
                    .col(Bookings::TenantId)
                    .col(Bookings::BookingCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookingItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookingItems::TenantId).uuid().not_null())
                    .col(ColumnDef::new(BookingItems::BookingId).uuid().not_null())
                    .col(ColumnDef::new(BookingItems::ServiceType).text().not_null())
                    .col(ColumnDef::new(BookingItems::ServiceOfferingId).uuid().null())
                    .col(ColumnDef::new(BookingItems::Description).text().not_null())
                    .col(ColumnDef::new(BookingItems::ServiceDate).date().null())
                    .col(
                        ColumnDef::new(BookingItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(BookingItems::UnitPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookingItems::TotalPrice)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BookingItems::Currency).text().not_null())
                    .col(
                        ColumnDef::new(BookingItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BookingItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_items_booking_id")
                            .from(BookingItems::Table, BookingItems::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_items_booking_id")
                    .table(BookingItems::Table)
                    .col(BookingItems::BookingId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quotations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Quotations {
    Table,
    Id,
    TenantId,
    ClientId,
    Title,
    Status,
    Currency,
    Items,
    TotalPrice,
    TravelStart,
    TravelEnd,
    SentAt,
    AcceptedAt,
    RejectedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    TenantId,
    BookingCode,
    QuotationId,
    ClientId,
    Status,
    StartDate,
    EndDate,
    TotalPrice,
    Currency,
    LockedExchangeRate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BookingItems {
    Table,
    Id,
    TenantId,
    BookingId,
    ServiceType,
    ServiceOfferingId,
    Description,
    ServiceDate,
    Quantity,
    UnitPrice,
    TotalPrice,
    Currency,
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
