//! Input validation for stays, guests, payments and reviews.
//!
//! Pure functions. "Today" is always passed in so callers and tests control
//! the clock.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{CardDetails, PaymentDetails, WalletDetails};

use super::requests::PaymentRequest;

/// Minimum review comment length, counted after trimming
pub const MIN_COMMENT_LEN: usize = 10;

/// Longest bookable stay
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Highest nightly rate a property may list at. Keeps every stay total
/// inside the NUMERIC(12, 2) money columns.
pub const MAX_NIGHTLY_RATE: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// A check-in/check-out pair that has passed validation.
///
/// Can only be built through [`StayDates::new`], so holding one proves
/// `check_in < check_out` and that the stay did not start in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Validate a stay.
    ///
    /// Fails with `InvalidRange` when check-out is not after check-in, with
    /// `PastDate` when check-in is before `today` and with `StayTooLong` past
    /// [`MAX_STAY_NIGHTS`]. Checking in today is allowed.
    pub fn new(
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if check_out <= check_in {
            return Err(ValidationError::InvalidRange {
                check_in,
                check_out,
            });
        }
        if check_in < today {
            return Err(ValidationError::PastDate { check_in, today });
        }
        let nights = (check_out - check_in).num_days();
        if nights > MAX_STAY_NIGHTS {
            return Err(ValidationError::StayTooLong {
                nights,
                max: MAX_STAY_NIGHTS,
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Calendar nights between the two dates (always >= 1)
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Nightly rate must be positive, whole cents and at most [`MAX_NIGHTLY_RATE`]
pub fn validate_nightly_rate(rate: Decimal) -> Result<(), ValidationError> {
    if rate <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveRate);
    }
    if rate > MAX_NIGHTLY_RATE {
        return Err(ValidationError::RateTooHigh {
            max: MAX_NIGHTLY_RATE,
        });
    }
    if rate.normalize().scale() > 2 {
        return Err(ValidationError::SubCentRate(rate));
    }
    Ok(())
}

/// Guest count must fit the property: 1..=max_guests
pub fn validate_guest_count(requested: i32, max_guests: i32) -> Result<(), ValidationError> {
    if requested < 1 || requested > max_guests {
        return Err(ValidationError::GuestCount {
            requested,
            max: max_guests,
        });
    }
    Ok(())
}

/// Validate a review, returning the trimmed comment
pub fn validate_review(rating: i16, comment: &str) -> Result<String, ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::Rating(rating));
    }
    let comment = comment.trim();
    if comment.chars().count() < MIN_COMMENT_LEN {
        return Err(ValidationError::CommentTooShort {
            min: MIN_COMMENT_LEN,
        });
    }
    Ok(comment.to_string())
}

/// Validate payment input and reduce it to what gets stored.
///
/// Card numbers may contain spaces or dashes. Only the last four digits
/// survive; the CVV is checked for shape and dropped.
pub fn validate_payment(
    request: &PaymentRequest,
    today: NaiveDate,
) -> Result<PaymentDetails, ValidationError> {
    match request {
        PaymentRequest::CreditCard {
            card_number,
            cardholder_name,
            expiry_month,
            expiry_year,
            cvv,
        } => {
            let digits: String = card_number
                .chars()
                .filter(|c| !matches!(c, ' ' | '-'))
                .collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) || !(12..=19).contains(&digits.len()) {
                return Err(ValidationError::Payment(
                    "card number must be 12 to 19 digits".to_string(),
                ));
            }
            let holder = cardholder_name.trim();
            if holder.is_empty() {
                return Err(ValidationError::Payment(
                    "cardholder name is required".to_string(),
                ));
            }
            if !(1..=12).contains(expiry_month) {
                return Err(ValidationError::Payment(format!(
                    "expiry month {} is not a month",
                    expiry_month
                )));
            }
            let current = (today.year(), today.month() as i32);
            if (*expiry_year, *expiry_month) < current {
                return Err(ValidationError::Payment("card has expired".to_string()));
            }
            if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::Payment(
                    "CVV must be 3 or 4 digits".to_string(),
                ));
            }

            Ok(PaymentDetails::CreditCard(CardDetails {
                cardholder_name: holder.to_string(),
                last_four: digits[digits.len() - 4..].to_string(),
                expiry_month: *expiry_month,
                expiry_year: *expiry_year,
            }))
        }
        PaymentRequest::DigitalWallet {
            provider,
            wallet_id,
        } => {
            let wallet_id = wallet_id.trim();
            if wallet_id.is_empty() {
                return Err(ValidationError::Payment("wallet id is required".to_string()));
            }
            Ok(PaymentDetails::DigitalWallet(WalletDetails {
                provider: *provider,
                wallet_id: wallet_id.to_string(),
            }))
        }
    }
}
