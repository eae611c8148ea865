//! Pricing engine for manual quotes.
//!
//! The calculator is pure; persistence of the resulting table is done by
//! [`crate::repositories::manual_quote`].

pub mod calculator;

pub use calculator::{
    ExpenseLine, PAX_TIERS, PaxPrice, PricingSettings, build_pricing_table, cost_for_pax,
    round_money,
};
