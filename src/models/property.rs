//! Property models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Property from the properties table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Property {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub address: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_night: Decimal,
    pub max_guests: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub amenities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Property with its review aggregate, as returned by search
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PropertyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

/// Validated input for a new property
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub location: String,
    pub address: String,
    pub price_per_night: Decimal,
    pub max_guests: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub amenities: Vec<String>,
}

/// Partial update applied by the owning host
#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub price_per_night: Option<Decimal>,
    pub max_guests: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub amenities: Option<Vec<String>>,
}

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.address.is_none()
            && self.price_per_night.is_none()
            && self.max_guests.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.amenities.is_none()
    }

    /// Apply the changes to an in-memory property
    pub fn apply(self, property: &mut Property) {
        if let Some(title) = self.title {
            property.title = title;
        }
        if let Some(description) = self.description {
            property.description = description;
        }
        if let Some(location) = self.location {
            property.location = location;
        }
        if let Some(address) = self.address {
            property.address = address;
        }
        if let Some(price) = self.price_per_night {
            property.price_per_night = price;
        }
        if let Some(max_guests) = self.max_guests {
            property.max_guests = max_guests;
        }
        if let Some(bedrooms) = self.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            property.bathrooms = bathrooms;
        }
        if let Some(amenities) = self.amenities {
            property.amenities = amenities;
        }
    }
}

/// Search filters. Every field is optional; `stay` excludes properties
/// with an overlapping active booking.
#[derive(Debug, Clone)]
pub struct PropertySearch {
    pub location: Option<String>,
    pub guests: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub stay: Option<(NaiveDate, NaiveDate)>,
    pub limit: i64,
}

impl Default for PropertySearch {
    fn default() -> Self {
        Self {
            location: None,
            guests: None,
            min_price: None,
            max_price: None,
            stay: None,
            limit: PropertySearch::DEFAULT_LIMIT,
        }
    }
}

impl PropertySearch {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn is_unfiltered(&self) -> bool {
        self.location.is_none()
            && self.guests.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.stay.is_none()
    }

    /// Check a property against the non-date filters
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(location) = &self.location {
            if !property
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(guests) = self.guests {
            if property.max_guests < guests {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if property.price_per_night < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if property.price_per_night > max {
                return false;
            }
        }
        true
    }
}
