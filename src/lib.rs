//! # Tour CRM Library
//!
//! Multi-tenant CRM backend for tour operators: clients and leads, vendor catalog
//! with seasonal rates, quotations that turn into bookings, payments, manual
//! per-pax quotes, audit timeline and data retention.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod idempotency;
pub mod models;
pub mod pricing;
pub mod quotation_workflow;
pub mod rates;
pub mod repositories;
pub mod retention;
pub mod server;
pub mod telemetry;
pub use migration;
