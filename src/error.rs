//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::BookingStatus;

/// Input that failed a booking, review, payment or property rule
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Check-out date {check_out} must be after check-in date {check_in}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Check-in date {check_in} is in the past (today is {today})")]
    PastDate { check_in: NaiveDate, today: NaiveDate },

    #[error("Guest count must be between 1 and {max}, got {requested}")]
    GuestCount { requested: i32, max: i32 },

    #[error("Nightly rate must be positive")]
    NonPositiveRate,

    #[error("Nightly rate must be at most {max}")]
    RateTooHigh { max: Decimal },

    #[error("Nightly rate {0} has more than two decimal places")]
    SubCentRate(Decimal),

    #[error("Stay of {nights} nights exceeds the {max} night maximum")]
    StayTooLong { nights: i64, max: i64 },

    #[error("Stay price is too large to compute")]
    PriceOverflow,

    #[error("Rating must be between 1 and 5, got {0}")]
    Rating(i16),

    #[error("Comment must be at least {min} characters")]
    CommentTooShort { min: usize },

    #[error("Invalid payment details: {0}")]
    Payment(String),

    #[error("Invalid {field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

/// Request that clashes with existing state
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConflictError {
    #[error("Dates {check_in} to {check_out} overlap booking {booking_id}")]
    Dates {
        booking_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Booking {0} has already been reviewed")]
    AlreadyReviewed(Uuid),

    #[error("Booking cannot move from {from} to {to}")]
    Transition { from: BookingStatus, to: BookingStatus },
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("Backend error: {0}")]
    Remote(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(_) => "conflict_error",
            AppError::Remote(_) => "remote_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Remote(e) => {
                tracing::error!("Backend error: {}", e);
                "Backend request failed".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            other => {
                tracing::debug!("Request rejected: {}", other);
                other.to_string()
            }
        };

        let body = ErrorResponse {
            error_type: self.error_type(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
