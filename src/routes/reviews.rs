//! Review route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::booking::requests::CreateReviewRequest;
use crate::booking::services;
use crate::error::Result;
use crate::models::Review;
use crate::session::Session;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/:id/review", post(create))
        .route("/api/properties/:id/reviews", get(list))
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub items: Vec<Review>,
}

async fn create(
    session: Session,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let review =
        services::submit_review(state.store.as_ref(), &session, booking_id, &request).await?;
    state.cache.invalidate_listings();
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<ReviewsResponse>> {
    let items = services::list_reviews(state.store.as_ref(), property_id).await?;
    Ok(Json(ReviewsResponse { items }))
}
