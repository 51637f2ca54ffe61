//! Booking models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::booking::calculators::StayPrice;
use crate::booking::validators::StayDates;

use super::payment::NewPayment;

/// Lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Active bookings hold their dates; cancelled ones release them.
    pub fn is_active(self) -> bool {
        self != BookingStatus::Cancelled
    }

    /// Allowed transitions:
    /// pending -> confirmed | cancelled, confirmed -> cancelled | completed.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking from the bookings table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_count: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub nightly_rate: Decimal,
    pub nights: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub service_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open overlap test against `[check_in, check_out)`
    pub fn overlaps(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }
}

/// Booking about to be inserted, already validated and priced
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub dates: StayDates,
    pub guest_count: i32,
    pub price: StayPrice,
}

/// Payment plus booking, written as one unit
#[derive(Debug, Clone)]
pub struct Reservation {
    pub booking: NewBooking,
    pub payment: NewPayment,
}
