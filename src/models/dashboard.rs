//! Per-user dashboard summaries

use serde::Serialize;
use sqlx::FromRow;

use super::{Booking, BookingStatus};

/// Booking totals broken down by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct BookingCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl BookingCounts {
    /// Count bookings by status
    pub fn tally<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        bookings
            .into_iter()
            .fold(Self::default(), |mut counts, booking| {
                counts.total += 1;
                match booking.status {
                    BookingStatus::Pending => counts.pending += 1,
                    BookingStatus::Confirmed => counts.confirmed += 1,
                    BookingStatus::Completed => counts.completed += 1,
                    BookingStatus::Cancelled => counts.cancelled += 1,
                }
                counts
            })
    }
}

/// A guest's stays and reviews
#[derive(Debug, Clone, Serialize)]
pub struct GuestDashboard {
    pub bookings: BookingCounts,
    /// Confirmed stays whose check-out is still ahead
    pub upcoming_stays: i64,
    pub reviews_written: i64,
}

/// A host's listings and the bookings made on them
#[derive(Debug, Clone, Serialize)]
pub struct HostDashboard {
    pub property_count: i64,
    pub bookings: BookingCounts,
    pub recent_bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Guest(GuestDashboard),
    Host(HostDashboard),
}
