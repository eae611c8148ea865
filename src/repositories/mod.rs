//! # Repository Layer
//!
//! Repositories wrap SeaORM queries for each aggregate. Every method takes the
//! caller's tenant id and filters on it, so a row owned by another tenant behaves
//! exactly like a missing row.

pub mod audit_log;
pub mod booking;
pub mod client;
pub mod exchange_rate;
pub mod idempotency_key;
pub mod lead;
pub mod manual_quote;
pub mod payment;
pub mod quotation;
pub mod rate;
pub mod service_offering;
pub mod tenant;
pub mod vendor;

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::json;

use crate::error::RepositoryError;

pub use audit_log::AuditLogRepository;
pub use booking::BookingRepository;
pub use client::ClientRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use idempotency_key::IdempotencyKeyRepository;
pub use lead::LeadRepository;
pub use manual_quote::ManualQuoteRepository;
pub use payment::PaymentRepository;
pub use quotation::QuotationRepository;
pub use rate::RateRepository;
pub use service_offering::ServiceOfferingRepository;
pub use tenant::{CreateTenantRequest, TenantRepository};
pub use vendor::VendorRepository;

/// Offset pagination window, already validated by the handler layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

const MAX_TEXT_LEN: usize = 255;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Trims `value` and rejects empty or over-long strings.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, RepositoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation_with_details(
            format!("{field} cannot be empty"),
            json!({ "field": field }),
        ));
    }
    if trimmed.len() > MAX_TEXT_LEN {
        return Err(RepositoryError::validation_with_details(
            format!("{field} cannot exceed {MAX_TEXT_LEN} characters"),
            json!({ "field": field, "max_length": MAX_TEXT_LEN }),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, mapping blank strings to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalizes an optional e-mail address to lower case and checks its shape.
pub(crate) fn normalize_email(value: Option<String>) -> Result<Option<String>, RepositoryError> {
    let Some(email) = optional_text(value) else {
        return Ok(None);
    };
    let email = email.to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(RepositoryError::validation_with_details(
            "email is not a valid address",
            json!({ "field": "email", "value": email }),
        ));
    }
    Ok(Some(email))
}

/// Upper-cases and checks an ISO 4217 style code.
pub(crate) fn normalize_currency(field: &str, value: &str) -> Result<String, RepositoryError> {
    let code = value.trim().to_ascii_uppercase();
    if !crate::config::is_currency_code(&code) {
        return Err(RepositoryError::validation_with_details(
            format!("{field} must be a three-letter currency code"),
            json!({ "field": field, "value": value }),
        ));
    }
    Ok(code)
}

/// Largest value a `DECIMAL(14, 2)` money column holds.
pub(crate) fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Rejects values above `max`, the capacity of the column they are stored in.
pub(crate) fn at_most(
    field: &str,
    value: Decimal,
    max: Decimal,
) -> Result<Decimal, RepositoryError> {
    if value > max {
        return Err(RepositoryError::validation_with_details(
            format!("{field} cannot exceed {max}"),
            json!({ "field": field, "value": value.to_string(), "max": max.to_string() }),
        ));
    }
    Ok(value)
}

pub(crate) fn non_negative(field: &str, value: Decimal) -> Result<Decimal, RepositoryError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RepositoryError::validation_with_details(
            format!("{field} must not be negative"),
            json!({ "field": field, "value": value.to_string() }),
        ));
    }
    at_most(field, value, max_amount())
}

pub(crate) fn positive(field: &str, value: Decimal) -> Result<Decimal, RepositoryError> {
    if value <= Decimal::ZERO {
        return Err(RepositoryError::validation_with_details(
            format!("{field} must be greater than zero"),
            json!({ "field": field, "value": value.to_string() }),
        ));
    }
    at_most(field, value, max_amount())
}
