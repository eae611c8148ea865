//! # Data Models
//!
//! SeaORM entities for every table in the CRM. Models double as API response bodies;
//! request DTOs live next to their handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod activity_rate;
pub mod audit_log;
pub mod booking;
pub mod booking_item;
pub mod client;
pub mod exchange_rate;
pub mod guide_rate;
pub mod hotel_room_rate;
pub mod idempotency_key;
pub mod lead;
pub mod manual_quote;
pub mod manual_quote_day;
pub mod manual_quote_expense;
pub mod payment_client;
pub mod payment_vendor;
pub mod quotation;
pub mod service_offering;
pub mod tenant;
pub mod transfer_rate;
pub mod vehicle_rate;
pub mod vendor;

pub use activity_rate::Entity as ActivityRate;
pub use audit_log::Entity as AuditLog;
pub use booking::Entity as Booking;
pub use booking_item::Entity as BookingItem;
pub use client::Entity as Client;
pub use exchange_rate::Entity as ExchangeRate;
pub use guide_rate::Entity as GuideRate;
pub use hotel_room_rate::Entity as HotelRoomRate;
pub use idempotency_key::Entity as IdempotencyKey;
pub use lead::Entity as Lead;
pub use manual_quote::Entity as ManualQuote;
pub use manual_quote_day::Entity as ManualQuoteDay;
pub use manual_quote_expense::Entity as ManualQuoteExpense;
pub use payment_client::Entity as PaymentClient;
pub use payment_vendor::Entity as PaymentVendor;
pub use quotation::Entity as Quotation;
pub use service_offering::Entity as ServiceOffering;
pub use tenant::Entity as Tenant;
pub use transfer_rate::Entity as TransferRate;
pub use vehicle_rate::Entity as VehicleRate;
pub use vendor::Entity as Vendor;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "tourcrm".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
