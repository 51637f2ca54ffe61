//! Booking route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Booking, Dashboard};
use crate::session::Session;
use crate::AppState;

use super::requests::{CreateBookingRequest, QuoteRequest};
use super::responses::{BookingsResponse, QuoteResponse, ReservationResponse};
use super::{services, today};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/properties/:id/quote", post(quote))
        .route("/api/properties/:id/bookings", post(create))
        .route("/api/bookings", get(list))
        .route("/api/host/bookings", get(list_for_host))
        .route("/api/bookings/:id", get(detail))
        .route("/api/bookings/:id/cancel", post(cancel))
        .route("/api/bookings/:id/confirm", post(confirm))
        .route("/api/bookings/:id/complete", post(complete))
        .route("/api/dashboard", get(dashboard))
}

/// Price a stay without booking it
async fn quote(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let quote = services::quote_stay(
        state.store.as_ref(),
        &state.pricing,
        property_id,
        &request,
        today(),
    )
    .await?;

    Ok(Json(QuoteResponse::from_price(
        quote.property.id,
        quote.dates.check_in(),
        quote.dates.check_out(),
        quote.guests,
        &quote.price,
        &state.currency,
        quote.available,
    )))
}

/// Book a property
async fn create(
    session: Session,
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    let (booking, payment) = services::reserve_stay(
        state.store.as_ref(),
        &state.pricing,
        &state.currency,
        &session,
        property_id,
        &request,
        today(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse { booking, payment }),
    ))
}

/// The caller's bookings (guest) or bookings on their properties (host)
async fn list(session: Session, State(state): State<AppState>) -> Result<Json<BookingsResponse>> {
    let items = services::list_bookings(state.store.as_ref(), &session).await?;
    Ok(Json(BookingsResponse { items }))
}

async fn list_for_host(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<BookingsResponse>> {
    session.require_host()?;
    let items = services::list_bookings(state.store.as_ref(), &session).await?;
    Ok(Json(BookingsResponse { items }))
}

async fn detail(
    session: Session,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = services::get_booking(state.store.as_ref(), &session, booking_id).await?;
    Ok(Json(booking))
}

async fn cancel(
    session: Session,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = services::cancel_booking(state.store.as_ref(), &session, booking_id).await?;
    Ok(Json(booking))
}

async fn confirm(
    session: Session,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = services::confirm_booking(state.store.as_ref(), &session, booking_id).await?;
    Ok(Json(booking))
}

async fn complete(
    session: Session,
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking =
        services::complete_booking(state.store.as_ref(), &session, booking_id, today()).await?;
    Ok(Json(booking))
}

/// Counts and recent activity for the caller
async fn dashboard(session: Session, State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let dashboard = services::dashboard(state.store.as_ref(), &session, today()).await?;
    Ok(Json(dashboard))
}
