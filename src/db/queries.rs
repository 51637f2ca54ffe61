//! Database queries for properties, bookings, payments and reviews.
//!
//! Every function takes any Postgres executor so it can run on the pool or
//! inside a transaction.

use chrono::NaiveDate;
use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, ConflictError, Result};
use crate::models::{
    Booking, BookingCounts, BookingStatus, NewBooking, NewPayment, NewProperty, NewReview, Payment,
    PaymentDetails, PaymentStatus, Property, PropertyChanges, PropertyListing, PropertySearch,
    Review,
};

const PROPERTY_COLUMNS: &str = r#"
    id, host_id, title, description, location, address,
    price_per_night, max_guests, bedrooms, bathrooms, amenities,
    created_at, updated_at
"#;

const BOOKING_COLUMNS: &str = r#"
    id, property_id, guest_id, payment_id, check_in, check_out, guest_count,
    nightly_rate, nights, base_price, service_fee, total_price, status,
    created_at, updated_at
"#;

const REVIEW_COLUMNS: &str = "id, booking_id, property_id, guest_id, rating, comment, created_at";

const PAYMENT_COLUMNS: &str = "id, amount, currency, status, method, created_at, updated_at";

/// Escape LIKE wildcards in user input
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ==================== properties ====================

/// Search properties with optional filters, newest first
pub async fn search_properties<'e, E: PgExecutor<'e>>(
    executor: E,
    search: &PropertySearch,
) -> Result<Vec<PropertyListing>> {
    let mut query = QueryBuilder::<Postgres>::new(
        r#"
        SELECT
            p.id, p.host_id, p.title, p.description, p.location, p.address,
            p.price_per_night, p.max_guests, p.bedrooms, p.bathrooms, p.amenities,
            p.created_at, p.updated_at,
            r.average_rating,
            COALESCE(r.review_count, 0) AS review_count
        FROM properties p
        LEFT JOIN (
            SELECT property_id, AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count
            FROM reviews
            GROUP BY property_id
        ) r ON r.property_id = p.id
        WHERE TRUE
        "#,
    );

    if let Some(location) = &search.location {
        query
            .push(" AND p.location ILIKE ")
            .push_bind(format!("%{}%", escape_like(location)));
    }
    if let Some(guests) = search.guests {
        query.push(" AND p.max_guests >= ").push_bind(guests);
    }
    if let Some(min_price) = search.min_price {
        query.push(" AND p.price_per_night >= ").push_bind(min_price);
    }
    if let Some(max_price) = search.max_price {
        query.push(" AND p.price_per_night <= ").push_bind(max_price);
    }
    if let Some((check_in, check_out)) = search.stay {
        query
            .push(
                " AND NOT EXISTS (SELECT 1 FROM bookings b \
                 WHERE b.property_id = p.id AND b.status <> 'cancelled' AND b.check_in < ",
            )
            .push_bind(check_out)
            .push(" AND b.check_out > ")
            .push_bind(check_in)
            .push(")");
    }

    query
        .push(" ORDER BY p.created_at DESC LIMIT ")
        .push_bind(search.limit);

    let listings = query
        .build_query_as::<PropertyListing>()
        .fetch_all(executor)
        .await?;

    Ok(listings)
}

/// Get a property by id
pub async fn find_property<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Property>> {
    let property = sqlx::query_as::<_, Property>(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(property)
}

/// Lock a property row for the rest of the transaction
pub async fn lock_property<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool> {
    let locked: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM properties WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

    Ok(locked.is_some())
}

/// Get all properties owned by a host
pub async fn list_host_properties<'e, E: PgExecutor<'e>>(
    executor: E,
    host_id: Uuid,
) -> Result<Vec<Property>> {
    let properties = sqlx::query_as::<_, Property>(&format!(
        "SELECT {PROPERTY_COLUMNS} FROM properties WHERE host_id = $1 ORDER BY created_at DESC"
    ))
    .bind(host_id)
    .fetch_all(executor)
    .await?;

    Ok(properties)
}

pub async fn insert_property<'e, E: PgExecutor<'e>>(
    executor: E,
    host_id: Uuid,
    property: NewProperty,
) -> Result<Property> {
    let property = sqlx::query_as::<_, Property>(&format!(
        r#"
        INSERT INTO properties (
            id, host_id, title, description, location, address,
            price_per_night, max_guests, bedrooms, bathrooms, amenities
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {PROPERTY_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(host_id)
    .bind(property.title)
    .bind(property.description)
    .bind(property.location)
    .bind(property.address)
    .bind(property.price_per_night)
    .bind(property.max_guests)
    .bind(property.bedrooms)
    .bind(property.bathrooms)
    .bind(property.amenities)
    .fetch_one(executor)
    .await?;

    Ok(property)
}

/// Apply a partial update; unset fields keep their current value
pub async fn update_property<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    changes: PropertyChanges,
) -> Result<Property> {
    sqlx::query_as::<_, Property>(&format!(
        r#"
        UPDATE properties SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            location = COALESCE($4, location),
            address = COALESCE($5, address),
            price_per_night = COALESCE($6, price_per_night),
            max_guests = COALESCE($7, max_guests),
            bedrooms = COALESCE($8, bedrooms),
            bathrooms = COALESCE($9, bathrooms),
            amenities = COALESCE($10, amenities),
            updated_at = now()
        WHERE id = $1
        RETURNING {PROPERTY_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.location)
    .bind(changes.address)
    .bind(changes.price_per_night)
    .bind(changes.max_guests)
    .bind(changes.bedrooms)
    .bind(changes.bathrooms)
    .bind(changes.amenities)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound("Property"))
}

/// Average rating and review count for a property
pub async fn property_rating<'e, E: PgExecutor<'e>>(
    executor: E,
    property_id: Uuid,
) -> Result<(Option<f64>, i64)> {
    let rating: (Option<f64>, i64) = sqlx::query_as(
        r#"
        SELECT AVG(rating)::float8, COUNT(*)
        FROM reviews
        WHERE property_id = $1
        "#,
    )
    .bind(property_id)
    .fetch_one(executor)
    .await?;

    Ok(rating)
}

// ==================== bookings ====================

/// Non-cancelled bookings of a property, ordered by check-in
pub async fn active_bookings<'e, E: PgExecutor<'e>>(
    executor: E,
    property_id: Uuid,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE property_id = $1
          AND status <> 'cancelled'
        ORDER BY check_in
        "#
    ))
    .bind(property_id)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

/// Active bookings of a property overlapping `[check_in, check_out)`
pub async fn overlapping_bookings<'e, E: PgExecutor<'e>>(
    executor: E,
    property_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        r#"
        SELECT {BOOKING_COLUMNS}
        FROM bookings
        WHERE property_id = $1
          AND status <> 'cancelled'
          AND check_in < $3
          AND check_out > $2
        ORDER BY check_in
        "#
    ))
    .bind(property_id)
    .bind(check_in)
    .bind(check_out)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

pub async fn insert_booking<'e, E: PgExecutor<'e>>(
    executor: E,
    booking: &NewBooking,
    payment_id: Uuid,
) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        INSERT INTO bookings (
            id, property_id, guest_id, payment_id, check_in, check_out, guest_count,
            nightly_rate, nights, base_price, service_fee, total_price, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(booking.property_id)
    .bind(booking.guest_id)
    .bind(payment_id)
    .bind(booking.dates.check_in())
    .bind(booking.dates.check_out())
    .bind(booking.guest_count)
    .bind(booking.price.nightly_rate)
    .bind(booking.price.nights as i32)
    .bind(booking.price.base)
    .bind(booking.price.service_fee)
    .bind(booking.price.total)
    .bind(BookingStatus::Pending)
    .fetch_one(executor)
    .await?;

    Ok(booking)
}

pub async fn find_booking<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(booking)
}

pub async fn list_guest_bookings<'e, E: PgExecutor<'e>>(
    executor: E,
    guest_id: Uuid,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE guest_id = $1 ORDER BY created_at DESC"
    ))
    .bind(guest_id)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

pub async fn list_host_bookings<'e, E: PgExecutor<'e>>(
    executor: E,
    host_id: Uuid,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            b.id, b.property_id, b.guest_id, b.payment_id, b.check_in, b.check_out,
            b.guest_count, b.nightly_rate, b.nights, b.base_price, b.service_fee,
            b.total_price, b.status, b.created_at, b.updated_at
        FROM bookings b
        JOIN properties p ON p.id = b.property_id
        WHERE p.host_id = $1
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(host_id)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}

/// Compare-and-set a booking's status. `None` when the booking is missing
/// or no longer in `from`.
pub async fn update_booking_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        UPDATE bookings
        SET status = $3, updated_at = now()
        WHERE id = $1 AND status = $2
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(executor)
    .await?;

    Ok(booking)
}

// ==================== payments ====================

pub async fn insert_payment<'e, E: PgExecutor<'e>>(
    executor: E,
    payment: &NewPayment,
) -> Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (id, amount, currency, status, method)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(PaymentStatus::Completed)
    .bind(payment.details.method())
    .fetch_one(executor)
    .await?;

    Ok(payment)
}

/// Store the card or wallet sub-record of a payment
pub async fn insert_payment_details<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: Uuid,
    details: &PaymentDetails,
) -> Result<()> {
    match details {
        PaymentDetails::CreditCard(card) => {
            sqlx::query(
                r#"
                INSERT INTO credit_card_payments (
                    payment_id, cardholder_name, last_four, expiry_month, expiry_year
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(payment_id)
            .bind(&card.cardholder_name)
            .bind(&card.last_four)
            .bind(card.expiry_month)
            .bind(card.expiry_year)
            .execute(executor)
            .await?;
        }
        PaymentDetails::DigitalWallet(wallet) => {
            sqlx::query(
                r#"
                INSERT INTO digital_wallet_payments (payment_id, provider, wallet_id)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(payment_id)
            .bind(wallet.provider.as_str())
            .bind(&wallet.wallet_id)
            .execute(executor)
            .await?;
        }
    }

    Ok(())
}

pub async fn set_payment_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: PaymentStatus,
) -> Result<()> {
    sqlx::query("UPDATE payments SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn find_payment<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(payment)
}

// ==================== reviews ====================

/// Insert a review. The unique index on booking_id turns a second review
/// into a conflict.
pub async fn insert_review<'e, E: PgExecutor<'e>>(executor: E, review: NewReview) -> Result<Review> {
    let booking_id = review.booking_id;

    sqlx::query_as::<_, Review>(&format!(
        r#"
        INSERT INTO reviews (id, booking_id, property_id, guest_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {REVIEW_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(review.booking_id)
    .bind(review.property_id)
    .bind(review.guest_id)
    .bind(review.rating)
    .bind(review.comment)
    .fetch_one(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ConflictError::AlreadyReviewed(booking_id).into()
        }
        other => AppError::Remote(other),
    })
}

pub async fn list_property_reviews<'e, E: PgExecutor<'e>>(
    executor: E,
    property_id: Uuid,
) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE property_id = $1 ORDER BY created_at DESC"
    ))
    .bind(property_id)
    .fetch_all(executor)
    .await?;

    Ok(reviews)
}

// ==================== dashboards ====================

pub async fn guest_booking_counts<'e, E: PgExecutor<'e>>(
    executor: E,
    guest_id: Uuid,
) -> Result<BookingCounts> {
    let counts = sqlx::query_as::<_, BookingCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
            COUNT(*) FILTER (WHERE status = 'completed') AS completed,
            COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled
        FROM bookings
        WHERE guest_id = $1
        "#,
    )
    .bind(guest_id)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// Confirmed stays of a guest that have not checked out by `today`
pub async fn count_upcoming_stays<'e, E: PgExecutor<'e>>(
    executor: E,
    guest_id: Uuid,
    today: NaiveDate,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings WHERE guest_id = $1 AND status = 'confirmed' AND check_out > $2",
    )
    .bind(guest_id)
    .bind(today)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

pub async fn count_guest_reviews<'e, E: PgExecutor<'e>>(executor: E, guest_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE guest_id = $1")
        .bind(guest_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

pub async fn count_host_properties<'e, E: PgExecutor<'e>>(executor: E, host_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE host_id = $1")
        .bind(host_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

pub async fn host_booking_counts<'e, E: PgExecutor<'e>>(
    executor: E,
    host_id: Uuid,
) -> Result<BookingCounts> {
    let counts = sqlx::query_as::<_, BookingCounts>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE b.status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE b.status = 'confirmed') AS confirmed,
            COUNT(*) FILTER (WHERE b.status = 'completed') AS completed,
            COUNT(*) FILTER (WHERE b.status = 'cancelled') AS cancelled
        FROM bookings b
        JOIN properties p ON p.id = b.property_id
        WHERE p.host_id = $1
        "#,
    )
    .bind(host_id)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// Newest bookings across a host's properties
pub async fn recent_host_bookings<'e, E: PgExecutor<'e>>(
    executor: E,
    host_id: Uuid,
    limit: i64,
) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT
            b.id, b.property_id, b.guest_id, b.payment_id, b.check_in, b.check_out,
            b.guest_count, b.nightly_rate, b.nights, b.base_price, b.service_fee,
            b.total_price, b.status, b.created_at, b.updated_at
        FROM bookings b
        JOIN properties p ON p.id = b.property_id
        WHERE p.host_id = $1
        ORDER BY b.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(host_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(bookings)
}
