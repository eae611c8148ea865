//! Database migrations for the tour operator CRM.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_000001_create_tenants;
mod m2026_01_05_000100_create_clients_and_leads;
mod m2026_01_05_000200_create_vendors_and_service_offerings;
mod m2026_01_05_000300_create_rate_tables;
mod m2026_01_05_000400_create_exchange_rates;
mod m2026_01_05_000500_create_quotations_and_bookings;
mod m2026_01_05_000600_create_payments;
mod m2026_01_05_000700_create_audit_logs_and_idempotency_keys;
mod m2026_01_05_000800_create_manual_quotes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_000001_create_tenants::Migration),
            Box::new(m2026_01_05_000100_create_clients_and_leads::Migration),
            Box::new(m2026_01_05_000200_create_vendors_and_service_offerings::Migration),
            Box::new(m2026_01_05_000300_create_rate_tables::Migration),
            Box::new(m2026_01_05_000400_create_exchange_rates::Migration),
            Box::new(m2026_01_05_000500_create_quotations_and_bookings::Migration),
            Box::new(m2026_01_05_000600_create_payments::Migration),
            Box::new(m2026_01_05_000700_create_audit_logs_and_idempotency_keys::Migration),
            Box::new(m2026_01_05_000800_create_manual_quotes::Migration),
        ]
    }
}
