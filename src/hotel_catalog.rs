//! # Hotel Catalog Module
//!
//! Time-cached snapshot of the surveyed-hotels catalog. The matcher is always
//! handed a complete snapshot; fetching happens here, before matching.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::hotel_matcher::HotelRecord;
use crate::sheets_errors::SheetsError;

/// Default freshness window for the cached catalog
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);

/// Something that can produce the full list of hotel records on demand
pub trait HotelSource: Send + Sync {
    fn fetch_hotels(&self) -> impl Future<Output = Result<Vec<HotelRecord>, SheetsError>> + Send;
}

struct Snapshot {
    hotels: Arc<Vec<HotelRecord>>,
    fetched_at: Instant,
}

/// Caching wrapper around a [`HotelSource`]
///
/// A fresh snapshot is served from memory. When the snapshot is older than
/// the TTL the source is queried again; if that fails, the stale snapshot is
/// served, the failure logged, and the next attempt waits another full TTL.
/// Only when no snapshot exists at all does the error reach the caller.
pub struct HotelCatalog<S> {
    source: S,
    ttl: Duration,
    cache: RwLock<Option<Snapshot>>,
}

impl<S: HotelSource> HotelCatalog<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current snapshot, refreshed if older than the TTL
    pub async fn hotels(&self) -> Result<Arc<Vec<HotelRecord>>, SheetsError> {
        {
            let cache = self.cache.read().await;
            if let Some(snapshot) = cache.as_ref().filter(|s| s.fetched_at.elapsed() < self.ttl) {
                return Ok(Arc::clone(&snapshot.hotels));
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the write lock
        if let Some(snapshot) = cache.as_ref().filter(|s| s.fetched_at.elapsed() < self.ttl) {
            debug!("Hotel catalog refreshed concurrently, using new snapshot");
            return Ok(Arc::clone(&snapshot.hotels));
        }
        self.reload(&mut cache).await
    }

    /// Force a reload from the source regardless of age
    pub async fn refresh(&self) -> Result<Arc<Vec<HotelRecord>>, SheetsError> {
        let mut cache = self.cache.write().await;
        self.reload(&mut cache).await
    }

    async fn reload(&self, cache: &mut Option<Snapshot>) -> Result<Arc<Vec<HotelRecord>>, SheetsError> {
        match self.source.fetch_hotels().await {
            Ok(hotels) => {
                info!(hotels_count = hotels.len(), "Loaded hotels from sheet");
                let hotels = Arc::new(hotels);
                *cache = Some(Snapshot {
                    hotels: Arc::clone(&hotels),
                    fetched_at: Instant::now(),
                });
                Ok(hotels)
            }
            Err(e) => match cache.as_mut() {
                Some(stale) => {
                    warn!(
                        error = %e,
                        age_secs = stale.fetched_at.elapsed().as_secs(),
                        retry_in_secs = self.ttl.as_secs(),
                        "Hotel catalog refresh failed, serving stale snapshot"
                    );
                    // next reload attempt waits a full TTL
                    stale.fetched_at = Instant::now();
                    Ok(Arc::clone(&stale.hotels))
                }
                None => Err(e),
            },
        }
    }
}
