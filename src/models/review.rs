//! Review models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Review from the reviews table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub rating: i16,
    pub comment: String,
}
