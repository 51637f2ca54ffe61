//! In-memory caching using moka
//!
//! Caches property details and the default (unfiltered) listing page.
//! Filtered searches always go to the store.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Property, PropertyListing, PropertySearch};
use crate::store::BookingStore;

const LATEST_LISTINGS_KEY: &str = "listings:latest";

/// Application cache holding properties and the default listing
#[derive(Clone)]
pub struct AppCache {
    /// Property details (id -> Property)
    pub properties: Cache<Uuid, Arc<Property>>,
    /// Listing pages (cache_key -> Vec<PropertyListing>)
    pub listings: Cache<String, Arc<Vec<PropertyListing>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Property details: 1000 entries, 30 min TTL, 10 min idle
            properties: Cache::builder()
                .max_capacity(1000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Listings: ratings move with every review, keep it short
            listings: Cache::builder()
                .max_capacity(10)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            properties_size: self.properties.entry_count(),
            listings_size: self.listings.entry_count(),
        }
    }

    pub async fn latest_listings(&self) -> Option<Arc<Vec<PropertyListing>>> {
        self.listings.get(LATEST_LISTINGS_KEY).await
    }

    pub async fn store_latest_listings(&self, listings: Vec<PropertyListing>) {
        self.listings
            .insert(LATEST_LISTINGS_KEY.to_string(), Arc::new(listings))
            .await;
    }

    /// Invalidate a property and every listing that may include it
    pub async fn invalidate_property(&self, id: Uuid) {
        self.properties.invalidate(&id).await;
        self.listings.invalidate_all();
        info!("Cache invalidated for property: {}", id);
    }

    /// Invalidate listings only (new property, new review)
    pub fn invalidate_listings(&self) {
        self.listings.invalidate_all();
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub properties_size: u64,
    pub listings_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, store: Arc<dyn BookingStore>) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, store.as_ref()).await;
    }
}

/// Warm the cache with the default listing and its properties
async fn warm_cache(cache: &AppCache, store: &dyn BookingStore) {
    info!("Starting cache warm-up...");

    match store.search_properties(&PropertySearch::default()).await {
        Ok(listings) => {
            for listing in &listings {
                cache
                    .properties
                    .insert(listing.property.id, Arc::new(listing.property.clone()))
                    .await;
            }
            cache.store_latest_listings(listings).await;
        }
        Err(e) => warn!("Failed to warm listing cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProperty;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_warm_cache_fills_listings_and_properties() {
        let store = MemoryStore::new();
        let property = store
            .insert_property(
                Uuid::new_v4(),
                NewProperty {
                    title: "Harbour loft".to_string(),
                    description: String::new(),
                    location: "Lisbon".to_string(),
                    address: String::new(),
                    price_per_night: dec!(120),
                    max_guests: 2,
                    bedrooms: 1,
                    bathrooms: 1,
                    amenities: vec![],
                },
            )
            .await
            .unwrap();

        let cache = AppCache::new();
        warm_cache(&cache, &store).await;

        let listings = cache.latest_listings().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert!(cache.properties.get(&property.id).await.is_some());

        cache.invalidate_property(property.id).await;
        assert!(cache.properties.get(&property.id).await.is_none());
        assert!(cache.latest_listings().await.is_none());
    }
}
