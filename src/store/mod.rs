//! Storage seam.
//!
//! Services talk to a [`BookingStore`] trait object so the same booking
//! logic runs against Postgres in production and an in-memory store in
//! tests and local development.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Booking, BookingStatus, GuestDashboard, HostDashboard, NewProperty, NewReview, Payment,
    Property, PropertyChanges, PropertyListing, PropertySearch, Reservation, Review,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Properties matching the filters, newest first, with review aggregates
    async fn search_properties(&self, search: &PropertySearch) -> Result<Vec<PropertyListing>>;

    async fn find_property(&self, id: Uuid) -> Result<Option<Property>>;

    async fn list_host_properties(&self, host_id: Uuid) -> Result<Vec<Property>>;

    async fn insert_property(&self, host_id: Uuid, property: NewProperty) -> Result<Property>;

    /// Apply changes; `NotFound` if the property does not exist
    async fn update_property(&self, id: Uuid, changes: PropertyChanges) -> Result<Property>;

    /// Average rating and review count for a property
    async fn property_rating(&self, property_id: Uuid) -> Result<(Option<f64>, i64)>;

    /// Non-cancelled bookings of a property
    async fn active_bookings(&self, property_id: Uuid) -> Result<Vec<Booking>>;

    /// Check availability, record the payment and its method sub-record, and
    /// insert the booking as one unit. Nothing is written on failure.
    async fn reserve(&self, reservation: Reservation) -> Result<(Booking, Payment)>;

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    async fn list_guest_bookings(&self, guest_id: Uuid) -> Result<Vec<Booking>>;

    /// Bookings across every property the host owns
    async fn list_host_bookings(&self, host_id: Uuid) -> Result<Vec<Booking>>;

    /// Move a booking from `from` to `to`, failing with a transition
    /// conflict if its status changed in the meantime. Cancelling refunds
    /// the booking's payment.
    async fn transition_booking(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Booking>;

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>>;

    /// Insert a review; conflict if the booking already has one
    async fn insert_review(&self, review: NewReview) -> Result<Review>;

    /// Reviews of a property, newest first
    async fn list_property_reviews(&self, property_id: Uuid) -> Result<Vec<Review>>;

    /// Booking counts, upcoming confirmed stays (check-out after `today`) and
    /// reviews written by a guest
    async fn guest_dashboard(&self, guest_id: Uuid, today: NaiveDate) -> Result<GuestDashboard>;

    /// Property count, booking counts and the `recent` newest bookings across
    /// a host's properties
    async fn host_dashboard(&self, host_id: Uuid, recent: i64) -> Result<HostDashboard>;
}
