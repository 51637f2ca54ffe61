//! Property route handlers: search, detail, host create/update/list

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::booking::validators::validate_nightly_rate;
use crate::booking::{today, StayDates};
use crate::error::{AppError, Result, ValidationError};
use crate::models::{
    NewProperty, Property, PropertyChanges, PropertyListing, PropertySearch, Review,
};
use crate::session::Session;
use crate::AppState;

const MAX_SEARCH_LIMIT: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/properties", get(search).post(create))
        .route("/api/properties/:id", get(detail).patch(update))
        .route("/api/host/properties", get(list_for_host))
}

/// Query parameters for property search
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub location: Option<String>,
    pub guests: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub limit: Option<i64>,
}

impl SearchQuery {
    /// Turn raw query parameters into store filters
    pub fn into_search(self, today: NaiveDate) -> std::result::Result<PropertySearch, ValidationError> {
        let stay = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => {
                let dates = StayDates::new(check_in, check_out, today)?;
                Some((dates.check_in(), dates.check_out()))
            }
            (None, None) => None,
            _ => {
                return Err(ValidationError::Field {
                    field: "check_in",
                    message: "check_in and check_out must be given together".to_string(),
                })
            }
        };

        Ok(PropertySearch {
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            guests: self.guests,
            min_price: self.min_price,
            max_price: self.max_price,
            stay,
            limit: self
                .limit
                .unwrap_or(PropertySearch::DEFAULT_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
        })
    }
}

/// Request to list a new property
#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub address: String,
    pub price_per_night: Decimal,
    pub max_guests: i32,
    #[serde(default)]
    pub bedrooms: i32,
    #[serde(default)]
    pub bathrooms: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Partial property update
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePropertyRequest {
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

/// Property with its reviews
#[derive(Debug, Serialize)]
pub struct PropertyDetailResponse {
    pub property: Property,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub items: Vec<PropertyListing>,
}

#[derive(Debug, Serialize)]
pub struct PropertiesResponse {
    pub items: Vec<Property>,
}

fn required_text(field: &'static str, value: &str) -> std::result::Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Field {
            field,
            message: "must not be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

fn check_count(field: &'static str, value: i32, min: i32) -> std::result::Result<(), ValidationError> {
    if value < min {
        return Err(ValidationError::Field {
            field,
            message: format!("must be at least {}", min),
        });
    }
    Ok(())
}

fn clean_amenities(amenities: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = amenities
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    cleaned.dedup();
    cleaned
}

/// Validate a new listing
pub fn validate_new_property(
    request: CreatePropertyRequest,
) -> std::result::Result<NewProperty, ValidationError> {
    validate_nightly_rate(request.price_per_night)?;
    check_count("max_guests", request.max_guests, 1)?;
    check_count("bedrooms", request.bedrooms, 0)?;
    check_count("bathrooms", request.bathrooms, 0)?;

    Ok(NewProperty {
        title: required_text("title", &request.title)?,
        description: request.description.trim().to_string(),
        location: required_text("location", &request.location)?,
        address: request.address.trim().to_string(),
        price_per_night: request.price_per_night,
        max_guests: request.max_guests,
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        amenities: clean_amenities(request.amenities),
    })
}

/// Validate a partial update; only the fields present are checked
pub fn validate_changes(
    request: UpdatePropertyRequest,
) -> std::result::Result<PropertyChanges, ValidationError> {
    if let Some(price) = request.price_per_night {
        validate_nightly_rate(price)?;
    }
    if let Some(max_guests) = request.max_guests {
        check_count("max_guests", max_guests, 1)?;
    }
    if let Some(bedrooms) = request.bedrooms {
        check_count("bedrooms", bedrooms, 0)?;
    }
    if let Some(bathrooms) = request.bathrooms {
        check_count("bathrooms", bathrooms, 0)?;
    }

    Ok(PropertyChanges {
        title: request
            .title
            .map(|t| required_text("title", &t))
            .transpose()?,
        description: request.description.map(|d| d.trim().to_string()),
        location: request
            .location
            .map(|l| required_text("location", &l))
            .transpose()?,
        address: request.address.map(|a| a.trim().to_string()),
        price_per_night: request.price_per_night,
        max_guests: request.max_guests,
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        amenities: request.amenities.map(clean_amenities),
    })
}

/// Load a property through the cache
pub async fn cached_property(state: &AppState, id: Uuid) -> Result<Arc<Property>> {
    if let Some(cached) = state.cache.properties.get(&id).await {
        tracing::debug!("Cache HIT for property: {}", id);
        return Ok(cached);
    }

    tracing::debug!("Cache MISS for property: {}", id);
    let property = state
        .store
        .find_property(id)
        .await?
        .ok_or(AppError::NotFound("Property"))?;
    let property = Arc::new(property);
    state.cache.properties.insert(id, property.clone()).await;
    Ok(property)
}

/// Property search
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ListingsResponse>> {
    let default_page = query.limit.is_none();
    let search = query.into_search(today())?;

    if default_page && search.is_unfiltered() {
        if let Some(cached) = state.cache.latest_listings().await {
            tracing::debug!("Cache HIT for latest listings");
            return Ok(Json(ListingsResponse {
                items: (*cached).clone(),
            }));
        }
    }

    let items = state.store.search_properties(&search).await?;
    if default_page && search.is_unfiltered() {
        state.cache.store_latest_listings(items.clone()).await;
    }

    Ok(Json(ListingsResponse { items }))
}

/// Property detail with reviews
async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyDetailResponse>> {
    let property = cached_property(&state, id).await?;
    let (average_rating, review_count) = state.store.property_rating(id).await?;
    let reviews = state.store.list_property_reviews(id).await?;

    Ok(Json(PropertyDetailResponse {
        property: (*property).clone(),
        average_rating,
        review_count,
        reviews,
    }))
}

/// List a new property
async fn create(
    session: Session,
    State(state): State<AppState>,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>)> {
    session.require_host()?;
    let new_property = validate_new_property(request)?;

    let property = state
        .store
        .insert_property(session.user_id, new_property)
        .await?;
    state.cache.invalidate_listings();
    tracing::info!("Host {} listed property {}", session.user_id, property.id);

    Ok((StatusCode::CREATED, Json(property)))
}

/// Edit a property (owning host only)
async fn update(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>> {
    session.require_host()?;
    let existing = state
        .store
        .find_property(id)
        .await?
        .ok_or(AppError::NotFound("Property"))?;
    if existing.host_id != session.user_id {
        return Err(AppError::forbidden("property belongs to another host"));
    }

    let changes = validate_changes(request)?;
    if changes.is_empty() {
        return Ok(Json(existing));
    }

    let property = state.store.update_property(id, changes).await?;
    state.cache.invalidate_property(id).await;

    Ok(Json(property))
}

/// The caller's own properties
async fn list_for_host(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<PropertiesResponse>> {
    session.require_host()?;
    let items = state.store.list_host_properties(session.user_id).await?;
    Ok(Json(PropertiesResponse { items }))
}
