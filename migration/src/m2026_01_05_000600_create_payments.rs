//! Migration to create the client and vendor payment ledgers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentsClient::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentsClient::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentsClient::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PaymentsClient::BookingId).uuid().not_null())
                    .col(
                        ColumnDef::new(PaymentsClient::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentsClient::Currency).text().not_null())
                    .col(ColumnDef::new(PaymentsClient::Method).text().not_null())
                    .col(ColumnDef::new(PaymentsClient::Reference).text().null())
                    .col(
                        ColumnDef::new(PaymentsClient::PaidAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentsClient::Status)
                            .text()
                            .not_null()
                            .default("COMPLETED"),
                    )
                    .col(
                        ColumnDef::new(PaymentsClient::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PaymentsClient::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_client_tenant_id")
                            .from(PaymentsClient::Table, PaymentsClient::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_client_booking_id")
                            .from(PaymentsClient::Table, PaymentsClient::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_client_tenant_booking")
                    .table(PaymentsClient::Table)
                    .col(PaymentsClient::TenantId)
                    .col(PaymentsClient::BookingId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentsVendor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentsVendor::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentsVendor::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PaymentsVendor::VendorId).uuid().not_null())
                    .col(ColumnDef::new(PaymentsVendor::BookingId).uuid().null())
                    .col(
                        ColumnDef::new(PaymentsVendor::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentsVendor::Currency).text().not_null())
                    .col(ColumnDef::new(PaymentsVendor::Method).text().not_null())
                    .col(ColumnDef::new(PaymentsVendor::Reference).text().null())
                    .col(
                        ColumnDef::new(PaymentsVendor::PaidAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentsVendor::Status)
                            .text()
                            .not_null()
                            .default("COMPLETED"),
                    )
                    .col(
                        ColumnDef::new(PaymentsVendor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PaymentsVendor::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_vendor_tenant_id")
                            .from(PaymentsVendor::Table, PaymentsVendor::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_vendor_vendor_id")
                            .from(PaymentsVendor::Table, PaymentsVendor::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_vendor_booking_id")
                            .from(PaymentsVendor::Table, PaymentsVendor::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentsVendor::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentsClient::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentsClient {
    Table,
    Id,
    TenantId,
    BookingId,
    Amount,
    Currency,
    Method,
    Reference,
    PaidAt,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PaymentsVendor {
    Table,
    Id,
    TenantId,
    VendorId,
    BookingId,
    Amount,
    Currency,
    Method,
    Reference,
    PaidAt,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
