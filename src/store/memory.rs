//! In-memory [`BookingStore`].
//!
//! All state sits behind one async `RwLock`; every write takes the write
//! guard, which makes `reserve` atomic with its availability check.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::booking::availability;
use crate::error::{AppError, ConflictError, Result};
use crate::models::{
    Booking, BookingCounts, BookingStatus, GuestDashboard, HostDashboard, NewProperty, NewReview,
    Payment, PaymentDetails, PaymentStatus, Property, PropertyChanges, PropertyListing,
    PropertySearch, Reservation, Review,
};

use super::BookingStore;

#[derive(Default)]
struct MemoryState {
    properties: HashMap<Uuid, Property>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, (Payment, PaymentDetails)>,
    reviews: HashMap<Uuid, Review>,
}

impl MemoryState {
    fn rating(&self, property_id: Uuid) -> (Option<f64>, i64) {
        let ratings: Vec<i16> = self
            .reviews
            .values()
            .filter(|r| r.property_id == property_id)
            .map(|r| r.rating)
            .collect();

        if ratings.is_empty() {
            return (None, 0);
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let count = ratings.len() as i64;
        (Some(sum as f64 / count as f64), count)
    }

    fn bookings_of(&self, property_id: Uuid) -> impl Iterator<Item = &Booking> {
        self.bookings
            .values()
            .filter(move |b| b.property_id == property_id && b.status.is_active())
    }
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded payments
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Stored method sub-record of a payment
    pub async fn payment_details(&self, payment_id: Uuid) -> Option<PaymentDetails> {
        self.state
            .read()
            .await
            .payments
            .get(&payment_id)
            .map(|(_, details)| details.clone())
    }
}

fn newest_first<T, F>(items: &mut [T], created_at: F)
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn search_properties(&self, search: &PropertySearch) -> Result<Vec<PropertyListing>> {
        let state = self.state.read().await;

        let mut listings: Vec<PropertyListing> = state
            .properties
            .values()
            .filter(|p| search.matches(p))
            .filter(|p| match search.stay {
                Some((check_in, check_out)) => !state
                    .bookings_of(p.id)
                    .any(|b| b.overlaps(check_in, check_out)),
                None => true,
            })
            .map(|p| {
                let (average_rating, review_count) = state.rating(p.id);
                PropertyListing {
                    property: p.clone(),
                    average_rating,
                    review_count,
                }
            })
            .collect();

        newest_first(&mut listings, |l| l.property.created_at);
        listings.truncate(search.limit.max(0) as usize);
        Ok(listings)
    }

    async fn find_property(&self, id: Uuid) -> Result<Option<Property>> {
        Ok(self.state.read().await.properties.get(&id).cloned())
    }

    async fn list_host_properties(&self, host_id: Uuid) -> Result<Vec<Property>> {
        let state = self.state.read().await;
        let mut properties: Vec<Property> = state
            .properties
            .values()
            .filter(|p| p.host_id == host_id)
            .cloned()
            .collect();
        newest_first(&mut properties, |p| p.created_at);
        Ok(properties)
    }

    async fn insert_property(&self, host_id: Uuid, property: NewProperty) -> Result<Property> {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            host_id,
            title: property.title,
            description: property.description,
            location: property.location,
            address: property.address,
            price_per_night: property.price_per_night,
            max_guests: property.max_guests,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            amenities: property.amenities,
            created_at: now,
            updated_at: now,
        };

        self.state
            .write()
            .await
            .properties
            .insert(property.id, property.clone());
        Ok(property)
    }

    async fn update_property(&self, id: Uuid, changes: PropertyChanges) -> Result<Property> {
        let mut state = self.state.write().await;
        let property = state
            .properties
            .get_mut(&id)
            .ok_or(AppError::NotFound("Property"))?;
        changes.apply(property);
        property.updated_at = Utc::now();
        Ok(property.clone())
    }

    async fn property_rating(&self, property_id: Uuid) -> Result<(Option<f64>, i64)> {
        Ok(self.state.read().await.rating(property_id))
    }

    async fn active_bookings(&self, property_id: Uuid) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state.bookings_of(property_id).cloned().collect();
        bookings.sort_by_key(|b| b.check_in);
        Ok(bookings)
    }

    async fn reserve(&self, reservation: Reservation) -> Result<(Booking, Payment)> {
        let Reservation { booking, payment } = reservation;
        let mut state = self.state.write().await;

        if !state.properties.contains_key(&booking.property_id) {
            return Err(AppError::NotFound("Property"));
        }
        availability::ensure_available(state.bookings_of(booking.property_id), &booking.dates)?;

        let now = Utc::now();
        let recorded = Payment {
            id: Uuid::new_v4(),
            amount: payment.amount,
            currency: payment.currency,
            status: PaymentStatus::Completed,
            method: payment.details.method(),
            created_at: now,
            updated_at: now,
        };
        let created = Booking {
            id: Uuid::new_v4(),
            property_id: booking.property_id,
            guest_id: booking.guest_id,
            payment_id: Some(recorded.id),
            check_in: booking.dates.check_in(),
            check_out: booking.dates.check_out(),
            guest_count: booking.guest_count,
            nightly_rate: booking.price.nightly_rate,
            nights: booking.price.nights as i32,
            base_price: booking.price.base,
            service_fee: booking.price.service_fee,
            total_price: booking.price.total,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        state
            .payments
            .insert(recorded.id, (recorded.clone(), payment.details));
        state.bookings.insert(created.id, created.clone());
        debug!("Reserved booking {} with payment {}", created.id, recorded.id);

        Ok((created, recorded))
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn list_guest_bookings(&self, guest_id: Uuid) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.guest_id == guest_id)
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn list_host_bookings(&self, host_id: Uuid) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| {
                state
                    .properties
                    .get(&b.property_id)
                    .is_some_and(|p| p.host_id == host_id)
            })
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn transition_booking(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Booking> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or(AppError::NotFound("Booking"))?;
        if booking.status != from {
            return Err(ConflictError::Transition {
                from: booking.status,
                to,
            }
            .into());
        }
        booking.status = to;
        booking.updated_at = now;
        let booking = booking.clone();

        if to == BookingStatus::Cancelled {
            if let Some((payment, _)) = booking
                .payment_id
                .and_then(|payment_id| state.payments.get_mut(&payment_id))
            {
                payment.status = PaymentStatus::Refunded;
                payment.updated_at = now;
            }
        }

        Ok(booking)
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self
            .state
            .read()
            .await
            .payments
            .get(&id)
            .map(|(payment, _)| payment.clone()))
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let mut state = self.state.write().await;

        if state.reviews.values().any(|r| r.booking_id == review.booking_id) {
            return Err(ConflictError::AlreadyReviewed(review.booking_id).into());
        }

        let review = Review {
            id: Uuid::new_v4(),
            booking_id: review.booking_id,
            property_id: review.property_id,
            guest_id: review.guest_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn list_property_reviews(&self, property_id: Uuid) -> Result<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| r.created_at);
        Ok(reviews)
    }

    async fn guest_dashboard(&self, guest_id: Uuid, today: NaiveDate) -> Result<GuestDashboard> {
        let state = self.state.read().await;
        let bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| b.guest_id == guest_id)
            .collect();
        let upcoming_stays = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Confirmed && b.check_out > today)
            .count() as i64;
        let reviews_written = state
            .reviews
            .values()
            .filter(|r| r.guest_id == guest_id)
            .count() as i64;

        Ok(GuestDashboard {
            bookings: BookingCounts::tally(bookings.iter().copied()),
            upcoming_stays,
            reviews_written,
        })
    }

    async fn host_dashboard(&self, host_id: Uuid, recent: i64) -> Result<HostDashboard> {
        let property_count = {
            let state = self.state.read().await;
            state
                .properties
                .values()
                .filter(|p| p.host_id == host_id)
                .count() as i64
        };
        let mut recent_bookings = self.list_host_bookings(host_id).await?;
        let bookings = BookingCounts::tally(&recent_bookings);
        recent_bookings.truncate(recent.max(0) as usize);

        Ok(HostDashboard {
            property_count,
            bookings,
            recent_bookings,
        })
    }
}
