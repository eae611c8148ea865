//! Migration to create the clients and leads tables.
//!
//! Clients are unique per tenant by email (NULL emails never collide). Leads may
//! optionally point at a client once the prospect is known.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Clients::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Clients::Name).text().not_null())
                    .col(ColumnDef::new(Clients::Email).text().null())
                    .col(ColumnDef::new(Clients::Phone).text().null())
                    .col(ColumnDef::new(Clients::Nationality).text().null())
                    .col(ColumnDef::new(Clients::Notes).text().null())
                    .col(
                        ColumnDef::new(Clients::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Clients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Clients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clients_tenant_id")
                            .from(Clients::Table, Clients::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_clients_tenant_email")
                    .table(Clients::Table)
                    .col(Clients::TenantId)
                    .col(Clients::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Leads::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Leads::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Leads::ClientId).uuid().null())
                    .col(ColumnDef::new(Leads::Name).text().not_null())
                    .col(ColumnDef::new(Leads::Email).text().null())
                    .col(ColumnDef::new(Leads::Phone).text().null())
                    .col(ColumnDef::new(Leads::Source).text().null())
                    .col(
                        ColumnDef::new(Leads::Status)
                            .text()
                            .not_null()
                            .default("NEW"),
                    )
                    .col(ColumnDef::new(Leads::TravelDate).date().null())
                    .col(ColumnDef::new(Leads::Pax).integer().null())
                    .col(ColumnDef::new(Leads::Notes).text().null())
                    .col(
                        ColumnDef::new(Leads::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Leads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Leads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_tenant_id")
                            .from(Leads::Table, Leads::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_client_id")
                            .from(Leads::Table, Leads::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_tenant_status")
                    .table(Leads::Table)
                    .col(Leads::TenantId)
                    .col(Leads::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    TenantId,
    Name,
    Email,
    Phone,
    Nationality,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
    TenantId,
    ClientId,
    Name,
    Email,
    Phone,
    Source,
    Status,
    TravelDate,
    Pax,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
