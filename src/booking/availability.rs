//! Date-overlap checks against existing bookings.
//!
//! Stays are half-open `[check_in, check_out)`: a guest may arrive on the
//! day the previous guest leaves. Cancelled bookings never block dates.
//! Stores call [`ensure_available`] under the same lock or transaction that
//! inserts the booking.

use crate::error::ConflictError;
use crate::models::Booking;

use super::validators::StayDates;

/// First active booking overlapping the stay, if any
pub fn find_conflict<'a, I>(existing: I, dates: &StayDates) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    existing
        .into_iter()
        .filter(|booking| booking.status.is_active())
        .find(|booking| booking.overlaps(dates.check_in(), dates.check_out()))
}

/// Fail with a date conflict if any active booking overlaps the stay
pub fn ensure_available<'a, I>(existing: I, dates: &StayDates) -> Result<(), ConflictError>
where
    I: IntoIterator<Item = &'a Booking>,
{
    match find_conflict(existing, dates) {
        Some(booking) => Err(ConflictError::Dates {
            booking_id: booking.id,
            check_in: booking.check_in,
            check_out: booking.check_out,
        }),
        None => Ok(()),
    }
}
