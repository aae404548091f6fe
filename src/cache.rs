//! Cached profile listings and their invalidation.
use crate::storage::PropertySummary;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scope covering every cached listing view.
pub const LAYOUT_SCOPE: &str = "/";

/// Receives hints that cached listing views are stale.
#[async_trait]
pub trait ViewCache: Send + Sync {
    /// `"/"` drops everything; any other scope drops views for that owner.
    async fn invalidate(&self, scope: &str);
}

/// Owner id → that owner's listing summaries.
///
/// Every invalidation bumps `epoch`. A listing loaded from the store is only
/// kept if no invalidation ran while the load was in flight.
#[derive(Clone)]
pub struct ListingCache {
    inner: Cache<String, Arc<Vec<PropertySummary>>>,
    epoch: Arc<AtomicU64>,
}

impl ListingCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, owner: &str) -> Option<Arc<Vec<PropertySummary>>> {
        self.inner.get(owner).await
    }

    /// Take this before reading the store; hand it back to `insert_loaded`.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Cache `listings` read from the store after `loaded_at` was taken.
    /// If an invalidation happened since, the entry is dropped again so a
    /// pre-write snapshot is never served.
    pub async fn insert_loaded(
        &self,
        owner: &str,
        listings: Vec<PropertySummary>,
        loaded_at: u64,
    ) -> Arc<Vec<PropertySummary>> {
        let listings = Arc::new(listings);
        self.inner.insert(owner.to_string(), listings.clone()).await;

        // An invalidation that bumps after this check also clears the entry
        if self.epoch() != loaded_at {
            tracing::debug!(%owner, "Discarding listings loaded across an invalidation");
            self.inner.invalidate(owner).await;
        }
        listings
    }
}

#[async_trait]
impl ViewCache for ListingCache {
    async fn invalidate(&self, scope: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if scope == LAYOUT_SCOPE {
            tracing::debug!("Invalidating all cached listings");
            self.inner.invalidate_all();
        } else {
            tracing::debug!(%scope, "Invalidating cached listings");
            self.inner.invalidate(scope).await;
        }
    }
}
