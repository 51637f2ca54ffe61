//! Booking module: stay validation, pricing, availability and the
//! reserve/cancel/confirm/complete flows.

pub mod availability;
pub mod calculators;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod validators;

// Re-export commonly used items
pub use availability::{ensure_available, find_conflict};
pub use calculators::{calculate_stay_price, round_money, PricingPolicy, StayPrice};
pub use routes::router;
pub use validators::StayDates;

use chrono::{NaiveDate, Utc};

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
