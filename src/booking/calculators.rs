//! Core pricing calculation functions.
//!
//! Pure functions for stay pricing - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValidationError;

use super::validators::{validate_nightly_rate, StayDates};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use staybook::booking::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Pricing knobs applied to every stay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Fraction of the base price charged as a service fee (0.10 = 10%)
    pub service_fee_rate: Decimal,
}

impl PricingPolicy {
    pub fn new(service_fee_rate: Decimal) -> Self {
        Self { service_fee_rate }
    }

    pub fn without_fee() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        // 10%
        Self::new(Decimal::new(10, 2))
    }
}

/// Price breakdown for a stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayPrice {
    #[serde(with = "rust_decimal::serde::str")]
    pub nightly_rate: Decimal,
    pub nights: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub base: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub service_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Calculate the price of a validated stay.
///
/// base = rate × nights, fee = base × fee rate (rounded to cents),
/// total = base + fee.
///
/// # Arguments
/// * `nightly_rate` - Property's price per night, see [`validate_nightly_rate`]
/// * `dates` - Validated stay
/// * `policy` - Service fee configuration
pub fn calculate_stay_price(
    nightly_rate: Decimal,
    dates: &StayDates,
    policy: &PricingPolicy,
) -> Result<StayPrice, ValidationError> {
    validate_nightly_rate(nightly_rate)?;

    let nights = dates.nights();
    let base = nightly_rate
        .checked_mul(Decimal::from(nights))
        .ok_or(ValidationError::PriceOverflow)?;
    let fee = base
        .checked_mul(policy.service_fee_rate)
        .ok_or(ValidationError::PriceOverflow)?;
    let service_fee = round_money(fee, 2);
    let total = base
        .checked_add(service_fee)
        .ok_or(ValidationError::PriceOverflow)?;

    Ok(StayPrice {
        nightly_rate,
        nights,
        base,
        service_fee,
        total,
    })
}
