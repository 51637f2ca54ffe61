//! Response DTOs for booking endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Booking, Payment};

use super::calculators::StayPrice;

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Response for a stay quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub nights: i64,
    pub nightly_rate: MoneyResponse,
    pub base: MoneyResponse,
    pub service_fee: MoneyResponse,
    pub total: MoneyResponse,
    pub available: bool,
}

impl QuoteResponse {
    pub fn from_price(
        property_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: i32,
        price: &StayPrice,
        currency: &str,
        available: bool,
    ) -> Self {
        Self {
            property_id,
            check_in,
            check_out,
            guests,
            nights: price.nights,
            nightly_rate: MoneyResponse::new(price.nightly_rate, currency),
            base: MoneyResponse::new(price.base, currency),
            service_fee: MoneyResponse::new(price.service_fee, currency),
            total: MoneyResponse::new(price.total, currency),
            available,
        }
    }
}

/// Response for a created booking
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub booking: Booking,
    pub payment: Payment,
}

/// Response for a list of bookings
#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub items: Vec<Booking>,
}
