//! Postgres-backed [`BookingStore`]

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::booking::availability;
use crate::db::queries;
use crate::error::{AppError, ConflictError, Result};
use crate::models::{
    Booking, BookingStatus, GuestDashboard, HostDashboard, NewProperty, NewReview, Payment,
    PaymentStatus, Property, PropertyChanges, PropertyListing, PropertySearch, Reservation,
    Review,
};

use super::BookingStore;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn search_properties(&self, search: &PropertySearch) -> Result<Vec<PropertyListing>> {
        queries::search_properties(&self.pool, search).await
    }

    async fn find_property(&self, id: Uuid) -> Result<Option<Property>> {
        queries::find_property(&self.pool, id).await
    }

    async fn list_host_properties(&self, host_id: Uuid) -> Result<Vec<Property>> {
        queries::list_host_properties(&self.pool, host_id).await
    }

    async fn insert_property(&self, host_id: Uuid, property: NewProperty) -> Result<Property> {
        queries::insert_property(&self.pool, host_id, property).await
    }

    async fn update_property(&self, id: Uuid, changes: PropertyChanges) -> Result<Property> {
        queries::update_property(&self.pool, id, changes).await
    }

    async fn property_rating(&self, property_id: Uuid) -> Result<(Option<f64>, i64)> {
        queries::property_rating(&self.pool, property_id).await
    }

    async fn active_bookings(&self, property_id: Uuid) -> Result<Vec<Booking>> {
        queries::active_bookings(&self.pool, property_id).await
    }

    async fn reserve(&self, reservation: Reservation) -> Result<(Booking, Payment)> {
        let Reservation { booking, payment } = reservation;
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent reservations of the same property
        if !queries::lock_property(&mut *tx, booking.property_id).await? {
            return Err(AppError::NotFound("Property"));
        }

        let overlapping = queries::overlapping_bookings(
            &mut *tx,
            booking.property_id,
            booking.dates.check_in(),
            booking.dates.check_out(),
        )
        .await?;
        availability::ensure_available(&overlapping, &booking.dates)?;

        let recorded = queries::insert_payment(&mut *tx, &payment).await?;
        queries::insert_payment_details(&mut *tx, recorded.id, &payment.details).await?;
        let created = queries::insert_booking(&mut *tx, &booking, recorded.id).await?;

        tx.commit().await?;
        info!(
            "Reserved booking {} for property {} ({} to {})",
            created.id, created.property_id, created.check_in, created.check_out
        );

        Ok((created, recorded))
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        queries::find_booking(&self.pool, id).await
    }

    async fn list_guest_bookings(&self, guest_id: Uuid) -> Result<Vec<Booking>> {
        queries::list_guest_bookings(&self.pool, guest_id).await
    }

    async fn list_host_bookings(&self, host_id: Uuid) -> Result<Vec<Booking>> {
        queries::list_host_bookings(&self.pool, host_id).await
    }

    async fn transition_booking(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        let booking = match queries::update_booking_status(&mut *tx, id, from, to).await? {
            Some(booking) => booking,
            None => {
                let current = queries::find_booking(&mut *tx, id)
                    .await?
                    .ok_or(AppError::NotFound("Booking"))?;
                return Err(ConflictError::Transition {
                    from: current.status,
                    to,
                }
                .into());
            }
        };

        if to == BookingStatus::Cancelled {
            if let Some(payment_id) = booking.payment_id {
                queries::set_payment_status(&mut *tx, payment_id, PaymentStatus::Refunded).await?;
            }
        }

        tx.commit().await?;
        Ok(booking)
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        queries::find_payment(&self.pool, id).await
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        queries::insert_review(&self.pool, review).await
    }

    async fn list_property_reviews(&self, property_id: Uuid) -> Result<Vec<Review>> {
        queries::list_property_reviews(&self.pool, property_id).await
    }

    async fn guest_dashboard(&self, guest_id: Uuid, today: NaiveDate) -> Result<GuestDashboard> {
        Ok(GuestDashboard {
            bookings: queries::guest_booking_counts(&self.pool, guest_id).await?,
            upcoming_stays: queries::count_upcoming_stays(&self.pool, guest_id, today).await?,
            reviews_written: queries::count_guest_reviews(&self.pool, guest_id).await?,
        })
    }

    async fn host_dashboard(&self, host_id: Uuid, recent: i64) -> Result<HostDashboard> {
        Ok(HostDashboard {
            property_count: queries::count_host_properties(&self.pool, host_id).await?,
            bookings: queries::host_booking_counts(&self.pool, host_id).await?,
            recent_bookings: queries::recent_host_bookings(&self.pool, host_id, recent).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::requests::{CreateBookingRequest, PaymentRequest};
    use crate::booking::services::{cancel_booking, confirm_booking, reserve_stay};
    use crate::booking::PricingPolicy;
    use crate::models::{BookingCounts, NewProperty, WalletProvider};
    use crate::session::Session;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, m, d).unwrap()
    }

    fn booking_request(check_in: NaiveDate, check_out: NaiveDate) -> CreateBookingRequest {
        CreateBookingRequest {
            check_in,
            check_out,
            guests: 2,
            payment: PaymentRequest::DigitalWallet {
                provider: WalletProvider::Gcash,
                wallet_id: "09171234567".to_string(),
            },
        }
    }

    async fn setup(pool: PgPool) -> anyhow::Result<(PgStore, Session, Property)> {
        let store = PgStore::new(pool);
        let host = Session::host(Uuid::new_v4());
        let property = store
            .insert_property(
                host.user_id,
                NewProperty {
                    title: "Rice terrace homestay".to_string(),
                    description: String::new(),
                    location: "Banaue".to_string(),
                    address: String::new(),
                    price_per_night: dec!(75.50),
                    max_guests: 4,
                    bedrooms: 2,
                    bathrooms: 1,
                    amenities: vec!["breakfast".to_string()],
                },
            )
            .await?;
        Ok((store, host, property))
    }

    async fn reserve(
        store: &PgStore,
        guest: &Session,
        property: &Property,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(Booking, Payment)> {
        reserve_stay(
            store,
            &PricingPolicy::default(),
            "PHP",
            guest,
            property.id,
            &booking_request(check_in, check_out),
            date(1, 1),
        )
        .await
    }

    async fn count_rows(pool: &PgPool, table: &str) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_reserve_records_booking_and_payment(pool: PgPool) -> anyhow::Result<()> {
        let (store, _host, property) = setup(pool.clone()).await?;
        let guest = Session::guest(Uuid::new_v4());

        let (booking, payment) = reserve(&store, &guest, &property, date(3, 1), date(3, 4)).await?;
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.nights, 3);
        assert_eq!(booking.base_price, dec!(226.50));
        assert_eq!(booking.service_fee, dec!(22.65));
        assert_eq!(booking.total_price, dec!(249.15));
        assert_eq!(booking.payment_id, Some(payment.id));
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(count_rows(&pool, "digital_wallet_payments").await?, 1);
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_conflicting_reserve_rolls_back_payment(pool: PgPool) -> anyhow::Result<()> {
        let (store, _host, property) = setup(pool.clone()).await?;
        let first = Session::guest(Uuid::new_v4());
        let second = Session::guest(Uuid::new_v4());

        reserve(&store, &first, &property, date(3, 1), date(3, 6)).await?;
        let err = reserve(&store, &second, &property, date(3, 5), date(3, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(ConflictError::Dates { .. })));

        assert_eq!(count_rows(&pool, "payments").await?, 1);
        assert_eq!(count_rows(&pool, "digital_wallet_payments").await?, 1);
        assert_eq!(count_rows(&pool, "bookings").await?, 1);

        // Back-to-back is fine
        reserve(&store, &second, &property, date(3, 6), date(3, 8)).await?;
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_concurrent_reserves_never_overlap(pool: PgPool) -> anyhow::Result<()> {
        let (store, _host, property) = setup(pool.clone()).await?;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let property = property.clone();
            handles.push(tokio::spawn(async move {
                let guest = Session::guest(Uuid::new_v4());
                reserve(&store, &guest, &property, date(4, 1), date(4, 4)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await? {
                Ok(_) => successes += 1,
                Err(err) => assert!(matches!(err, AppError::Conflict(ConflictError::Dates { .. }))),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.active_bookings(property.id).await?.len(), 1);
        assert_eq!(count_rows(&pool, "payments").await?, 1);
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_stale_transition_conflicts(pool: PgPool) -> anyhow::Result<()> {
        let (store, host, property) = setup(pool).await?;
        let guest = Session::guest(Uuid::new_v4());
        let (booking, payment) = reserve(&store, &guest, &property, date(3, 1), date(3, 4)).await?;

        confirm_booking(&store, &host, booking.id).await?;

        // A caller still holding the pending snapshot loses the race
        let err = store
            .transition_booking(booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict(ConflictError::Transition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
            })
        ));
        let payment_now = store.find_payment(payment.id).await?.unwrap();
        assert_eq!(payment_now.status, PaymentStatus::Completed);

        let err = store
            .transition_booking(Uuid::new_v4(), BookingStatus::Pending, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Booking")));

        let cancelled = cancel_booking(&store, &guest, booking.id).await?;
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        let payment_now = store.find_payment(payment.id).await?.unwrap();
        assert_eq!(payment_now.status, PaymentStatus::Refunded);
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_duplicate_review_conflicts(pool: PgPool) -> anyhow::Result<()> {
        let (store, _host, property) = setup(pool).await?;
        let guest = Session::guest(Uuid::new_v4());
        let (booking, _) = reserve(&store, &guest, &property, date(3, 1), date(3, 4)).await?;

        let review = || NewReview {
            booking_id: booking.id,
            property_id: property.id,
            guest_id: guest.user_id,
            rating: 4,
            comment: "Quiet mornings, great host".to_string(),
        };

        store.insert_review(review()).await?;
        let err = store.insert_review(review()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict(ConflictError::AlreadyReviewed(id)) if id == booking.id
        ));

        let (average, count) = store.property_rating(property.id).await?;
        assert_eq!(count, 1);
        assert_eq!(average, Some(4.0));
        Ok(())
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_search_and_dashboards(pool: PgPool) -> anyhow::Result<()> {
        let (store, host, property) = setup(pool).await?;
        let guest = Session::guest(Uuid::new_v4());
        let (booking, _) = reserve(&store, &guest, &property, date(3, 1), date(3, 4)).await?;
        confirm_booking(&store, &host, booking.id).await?;

        let search = PropertySearch {
            location: Some("banaue".to_string()),
            stay: Some((date(3, 2), date(3, 3))),
            ..PropertySearch::default()
        };
        assert!(store.search_properties(&search).await?.is_empty());

        let search = PropertySearch {
            location: Some("banaue".to_string()),
            stay: Some((date(3, 4), date(3, 6))),
            ..PropertySearch::default()
        };
        let listings = store.search_properties(&search).await?;
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].review_count, 0);

        let summary = store.guest_dashboard(guest.user_id, date(1, 1)).await?;
        assert_eq!(
            summary.bookings,
            BookingCounts {
                total: 1,
                confirmed: 1,
                ..BookingCounts::default()
            }
        );
        assert_eq!(summary.upcoming_stays, 1);
        assert_eq!(summary.reviews_written, 0);

        let summary = store.host_dashboard(host.user_id, 5).await?;
        assert_eq!(summary.property_count, 1);
        assert_eq!(summary.bookings.total, 1);
        assert_eq!(summary.recent_bookings.len(), 1);
        Ok(())
    }
}
