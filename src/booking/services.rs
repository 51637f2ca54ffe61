//! Booking service functions with store access.
//!
//! Each function takes the store, the caller's session and "today", runs the
//! pure validators and calculators, and lets the store apply the write.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, ConflictError, Result, ValidationError};
use crate::models::{
    Booking, BookingStatus, Dashboard, NewBooking, NewPayment, NewReview, Payment, Property,
    Reservation, Review,
};
use crate::session::{Role, Session};
use crate::store::BookingStore;

use super::availability;
use super::calculators::{calculate_stay_price, PricingPolicy, StayPrice};
use super::requests::{CreateBookingRequest, CreateReviewRequest, QuoteRequest};
use super::validators::{validate_guest_count, validate_payment, validate_review, StayDates};

/// Result of pricing a stay without booking it
#[derive(Debug, Clone)]
pub struct Quote {
    pub property: Property,
    pub dates: StayDates,
    pub guests: i32,
    pub price: StayPrice,
    pub available: bool,
}

async fn load_property(store: &dyn BookingStore, property_id: Uuid) -> Result<Property> {
    store
        .find_property(property_id)
        .await?
        .ok_or(AppError::NotFound("Property"))
}

async fn load_booking(store: &dyn BookingStore, booking_id: Uuid) -> Result<Booking> {
    store
        .find_booking(booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking"))
}

/// Price a stay and report whether the dates are free.
pub async fn quote_stay(
    store: &dyn BookingStore,
    policy: &PricingPolicy,
    property_id: Uuid,
    request: &QuoteRequest,
    today: NaiveDate,
) -> Result<Quote> {
    let property = load_property(store, property_id).await?;
    let dates = StayDates::new(request.check_in, request.check_out, today)?;
    validate_guest_count(request.guests, property.max_guests)?;
    let price = calculate_stay_price(property.price_per_night, &dates, policy)?;

    let existing = store.active_bookings(property_id).await?;
    let available = availability::find_conflict(&existing, &dates).is_none();

    Ok(Quote {
        property,
        dates,
        guests: request.guests,
        price,
        available,
    })
}

/// Book a property for a guest.
///
/// Validates dates, guest count and payment details, prices the stay and
/// hands the store one reservation: availability check, payment and
/// booking succeed or fail together.
pub async fn reserve_stay(
    store: &dyn BookingStore,
    policy: &PricingPolicy,
    currency: &str,
    session: &Session,
    property_id: Uuid,
    request: &CreateBookingRequest,
    today: NaiveDate,
) -> Result<(Booking, Payment)> {
    session.require_guest()?;
    let property = load_property(store, property_id).await?;
    if property.host_id == session.user_id {
        return Err(AppError::forbidden("hosts cannot book their own property"));
    }

    let dates = StayDates::new(request.check_in, request.check_out, today)?;
    validate_guest_count(request.guests, property.max_guests)?;
    let details = validate_payment(&request.payment, today)?;
    let price = calculate_stay_price(property.price_per_night, &dates, policy)?;

    let reservation = Reservation {
        booking: NewBooking {
            property_id,
            guest_id: session.user_id,
            dates,
            guest_count: request.guests,
            price,
        },
        payment: NewPayment {
            amount: price.total,
            currency: currency.to_string(),
            details,
        },
    };

    let (booking, payment) = store.reserve(reservation).await?;
    info!(
        "Guest {} booked property {} for {} nights (total {} {})",
        session.user_id, property_id, price.nights, price.total, currency
    );

    Ok((booking, payment))
}

/// A booking, visible to its guest and to the property's host
pub async fn get_booking(
    store: &dyn BookingStore,
    session: &Session,
    booking_id: Uuid,
) -> Result<Booking> {
    let booking = load_booking(store, booking_id).await?;
    authorize_booking_access(store, session, &booking).await?;
    Ok(booking)
}

/// Bookings visible to the caller: a guest's own, or all bookings on a
/// host's properties
pub async fn list_bookings(store: &dyn BookingStore, session: &Session) -> Result<Vec<Booking>> {
    match session.role {
        Role::Guest => store.list_guest_bookings(session.user_id).await,
        Role::Host => store.list_host_bookings(session.user_id).await,
    }
}

/// Cancel a pending or confirmed booking (guest or host); refunds payment
pub async fn cancel_booking(
    store: &dyn BookingStore,
    session: &Session,
    booking_id: Uuid,
) -> Result<Booking> {
    let booking = load_booking(store, booking_id).await?;
    authorize_booking_access(store, session, &booking).await?;
    transition(store, &booking, BookingStatus::Cancelled).await
}

/// Host accepts a pending booking
pub async fn confirm_booking(
    store: &dyn BookingStore,
    session: &Session,
    booking_id: Uuid,
) -> Result<Booking> {
    session.require_host()?;
    let booking = load_booking(store, booking_id).await?;
    authorize_host(store, session, &booking).await?;
    transition(store, &booking, BookingStatus::Confirmed).await
}

/// Host marks a confirmed stay as completed once check-out has arrived
pub async fn complete_booking(
    store: &dyn BookingStore,
    session: &Session,
    booking_id: Uuid,
    today: NaiveDate,
) -> Result<Booking> {
    session.require_host()?;
    let booking = load_booking(store, booking_id).await?;
    authorize_host(store, session, &booking).await?;

    if today < booking.check_out {
        return Err(AppError::Validation(ValidationError::Field {
            field: "status",
            message: format!("stay cannot be completed before check-out on {}", booking.check_out),
        }));
    }

    transition(store, &booking, BookingStatus::Completed).await
}

/// Review a completed booking.
///
/// Only the booking's guest may review, once per booking.
pub async fn submit_review(
    store: &dyn BookingStore,
    session: &Session,
    booking_id: Uuid,
    request: &CreateReviewRequest,
) -> Result<Review> {
    session.require_guest()?;
    let booking = load_booking(store, booking_id).await?;
    if booking.guest_id != session.user_id {
        return Err(AppError::forbidden("only the booking's guest can review it"));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::forbidden(format!(
            "booking is {}, reviews open once the stay is completed",
            booking.status
        )));
    }

    let comment = validate_review(request.rating, &request.comment)?;
    store
        .insert_review(NewReview {
            booking_id,
            property_id: booking.property_id,
            guest_id: session.user_id,
            rating: request.rating,
            comment,
        })
        .await
}

/// Reviews of an existing property, newest first
pub async fn list_reviews(store: &dyn BookingStore, property_id: Uuid) -> Result<Vec<Review>> {
    load_property(store, property_id).await?;
    store.list_property_reviews(property_id).await
}

/// Bookings shown on a host's dashboard
pub const RECENT_BOOKINGS: i64 = 5;

/// Summary for the caller's dashboard: stay and review counts for a guest,
/// listings and incoming bookings for a host
pub async fn dashboard(
    store: &dyn BookingStore,
    session: &Session,
    today: NaiveDate,
) -> Result<Dashboard> {
    let dashboard = match session.role {
        Role::Guest => Dashboard::Guest(store.guest_dashboard(session.user_id, today).await?),
        Role::Host => Dashboard::Host(store.host_dashboard(session.user_id, RECENT_BOOKINGS).await?),
    };
    Ok(dashboard)
}

async fn transition(
    store: &dyn BookingStore,
    booking: &Booking,
    to: BookingStatus,
) -> Result<Booking> {
    if !booking.status.can_transition_to(to) {
        return Err(ConflictError::Transition {
            from: booking.status,
            to,
        }
        .into());
    }

    let updated = store.transition_booking(booking.id, booking.status, to).await?;
    info!("Booking {} moved from {} to {}", booking.id, booking.status, to);
    Ok(updated)
}

async fn authorize_booking_access(
    store: &dyn BookingStore,
    session: &Session,
    booking: &Booking,
) -> Result<()> {
    match session.role {
        Role::Guest if booking.guest_id == session.user_id => Ok(()),
        Role::Guest => Err(AppError::forbidden("booking belongs to another guest")),
        Role::Host => authorize_host(store, session, booking).await,
    }
}

async fn authorize_host(store: &dyn BookingStore, session: &Session, booking: &Booking) -> Result<()> {
    let property = load_property(store, booking.property_id).await?;
    if session.role != Role::Host || property.host_id != session.user_id {
        return Err(AppError::forbidden("booking is for another host's property"));
    }
    Ok(())
}
