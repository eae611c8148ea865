//! Core pricing calculation functions.
//!
//! Pure functions for pricing math, no database access. For every PAX tier the cost
//! is the sum of all expense lines (per-person lines scale with PAX, vehicle-priced
//! transportation does not), then markup and tax are applied in that order.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::manual_quote::TransportPricing;
use crate::models::manual_quote_expense::{self, ExpenseCategory};

/// Group sizes every manual quote is priced for.
pub const PAX_TIERS: [u32; 5] = [2, 4, 6, 8, 10];

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round to `places` decimals, halves away from zero (2.345 → 2.35, -2.345 → -2.35).
///
/// ```
/// use rust_decimal_macros::dec;
/// use tourcrm::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.345), 2), dec!(2.35));
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Minimal view of an expense row needed for pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseLine {
    pub category: ExpenseCategory,
    pub price: Decimal,
}

impl From<&manual_quote_expense::Model> for ExpenseLine {
    fn from(model: &manual_quote_expense::Model) -> Self {
        Self {
            category: model.category,
            price: model.price,
        }
    }
}

/// Quote-level knobs applied on top of the summed cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingSettings {
    pub markup_percent: Decimal,
    pub tax_percent: Decimal,
    pub transport_pricing: TransportPricing,
}

/// One row of the persisted pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaxPrice {
    #[schema(example = 4)]
    pub pax: u32,
    /// Cost before markup and tax, rounded to cents
    #[schema(value_type = String, example = "820.00")]
    pub cost_total: Decimal,
    #[schema(value_type = String, example = "1037.30")]
    pub sell_total: Decimal,
    #[schema(value_type = String, example = "259.33")]
    pub sell_per_person: Decimal,
}

fn is_fixed_cost(line: &ExpenseLine, mode: TransportPricing) -> bool {
    line.category == ExpenseCategory::Transportation && mode == TransportPricing::PerVehicle
}

/// Total cost of all lines for a group of `pax` travellers.
pub fn cost_for_pax(lines: &[ExpenseLine], mode: TransportPricing, pax: u32) -> Decimal {
    let pax = Decimal::from(pax);
    lines
        .iter()
        .map(|line| {
            if is_fixed_cost(line, mode) {
                line.price
            } else {
                line.price * pax
            }
        })
        .sum()
}

/// Prices every tier in [`PAX_TIERS`].
pub fn build_pricing_table(lines: &[ExpenseLine], settings: &PricingSettings) -> Vec<PaxPrice> {
    let markup = Decimal::ONE + settings.markup_percent / HUNDRED;
    let tax = Decimal::ONE + settings.tax_percent / HUNDRED;

    PAX_TIERS
        .iter()
        .map(|&pax| {
            let cost = cost_for_pax(lines, settings.transport_pricing, pax);
            let sell_total = round_money(cost * markup * tax, 2);
            PaxPrice {
                pax,
                cost_total: round_money(cost, 2),
                sell_total,
                sell_per_person: round_money(sell_total / Decimal::from(pax), 2),
            }
        })
        .collect()
}
