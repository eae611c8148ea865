//! Migration to create the vendors and service_offerings tables.
//!
//! A service offering is a priced catalog entry (hotel room, transfer, vehicle,
//! guide, activity) supplied by a vendor.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vendors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vendors::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Vendors::Name).text().not_null())
                    .col(ColumnDef::new(Vendors::VendorType).text().not_null())
                    .col(ColumnDef::new(Vendors::Email).text().null())
                    .col(ColumnDef::new(Vendors::Phone).text().null())
                    .col(ColumnDef::new(Vendors::City).text().null())
                    .col(
                        ColumnDef::new(Vendors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vendors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vendors_tenant_id")
                            .from(Vendors::Table, Vendors::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceOfferings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOfferings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceOfferings::TenantId).uuid().not_null())
                    .col(ColumnDef::new(ServiceOfferings::VendorId).uuid().not_null())
                    .col(ColumnDef::new(ServiceOfferings::ServiceType).text().not_null())
                    .col(ColumnDef::new(ServiceOfferings::Name).text().not_null())
                    .col(ColumnDef::new(ServiceOfferings::Description).text().null())
                    .col(
                        ColumnDef::new(ServiceOfferings::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ServiceOfferings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ServiceOfferings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_offerings_tenant_id")
                            .from(ServiceOfferings::Table, ServiceOfferings::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_offerings_vendor_id")
                            .from(ServiceOfferings::Table, ServiceOfferings::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_offerings_tenant_vendor")
                    .table(ServiceOfferings::Table)
                    .col(ServiceOfferings::TenantId)
                    .col(ServiceOfferings::VendorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceOfferings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    TenantId,
    Name,
    VendorType,
    Email,
    Phone,
    City,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ServiceOfferings {
    Table,
    Id,
    TenantId,
    VendorId,
    ServiceType,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
