//! City geocoding with a persistent cache
//!
//! Two tiers:
//! 1. [`GeocodeCache`], keyed by normalised `"city|country"`. Hits cost
//!    nothing, and failed lookups are cached as `None` so they are not
//!    retried.
//! 2. A [`GeocodeProvider`] (Nominatim by default), called through a
//!    process-wide [`RateLimiter`] at no more than one request per second.
//!
//! The scoring hot path only ever uses [`GeocodeCache::resolve_cached_only`].

use crate::config::GeocoderConfig;
use crate::{Coordinates, Result, Supplier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("geocode request failed: {0}")]
    Request(String),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("unreadable geocoder response: {0}")]
    Parse(String),
}

/// External city → coordinates lookup
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &str;
    /// `Ok(None)` means the service answered but found nothing
    async fn lookup(&self, query: &str) -> std::result::Result<Option<Coordinates>, GeocodeError>;
}

/// Cache hit/miss statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Thread-safe geocode cache, optionally mirrored to a JSON file.
///
/// [`insert`](Self::insert) only touches memory; [`persist`](Self::persist)
/// writes the whole table. [`Geocoder::resolve`] persists after every new
/// entry, so a crash loses at most the entry being written.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: RwLock<HashMap<String, Option<Coordinates>>>,
    path: Option<PathBuf>,
    flush_lock: Mutex<()>,
}

impl GeocodeCache {
    /// Cache that lives only for the process lifetime
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed cache, loading existing entries when the file exists.
    ///
    /// An unreadable cache file is logged and replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, Option<Coordinates>>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring corrupt geocode cache {:?}: {}", path, e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        info!("Geocode cache opened at {:?} ({} entries)", path, entries.len());

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
            flush_lock: Mutex::new(()),
        })
    }

    /// Normalised `"city|country"` key
    pub fn key(city: &str, country: &str) -> String {
        format!("{}|{}", city.trim().to_lowercase(), country.trim().to_lowercase())
    }

    /// `Some(None)` is a cached failure, `None` a cache miss
    pub fn get(&self, city: &str, country: &str) -> Option<Option<Coordinates>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&Self::key(city, country)).copied()
    }

    /// Store a result (or a failure) in memory.
    ///
    /// A successful lookup also registers the bare `"city|"` key when it is
    /// not taken yet, so country-less text mentions can find it.
    pub fn insert(&self, city: &str, country: &str, coordinates: Option<Coordinates>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(Self::key(city, country), coordinates);
        if coordinates.is_some() && !country.trim().is_empty() {
            entries.entry(Self::key(city, "")).or_insert(coordinates);
        }
    }

    /// Cache-only resolution: `"city|country"`, then the looser `"city|"`.
    /// Never touches the network.
    pub fn resolve_cached_only(&self, city: &str, country: &str) -> Option<Coordinates> {
        if city.trim().is_empty() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&Self::key(city, country))
            .copied()
            .flatten()
            .or_else(|| entries.get(&Self::key(city, "")).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let successful = entries.values().filter(|v| v.is_some()).count();
        CacheStats {
            total: entries.len(),
            successful,
            failed: entries.len() - successful,
        }
    }

    /// Write the table to its backing file; a no-op for in-memory caches
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        // Serialise snapshot + write so an older snapshot never lands last
        let _guard = self.flush_lock.lock().await;
        let json = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            serde_json::to_string_pretty(&*entries)?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Process-wide request spacing shared by every caller
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: tokio::sync::Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous grant.
    ///
    /// The lock is held while sleeping, so concurrent callers queue up and
    /// the combined rate stays within the limit.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Nominatim (OpenStreetMap) search client
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimProvider {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn lookup(&self, query: &str) -> std::result::Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let Some(place) = places.first() else {
            return Ok(None);
        };
        let lat = place.lat.parse::<f64>().map_err(|e| GeocodeError::Parse(e.to_string()))?;
        let lon = place.lon.parse::<f64>().map_err(|e| GeocodeError::Parse(e.to_string()))?;
        let coords = Coordinates::new(lat, lon);

        Ok(coords.is_valid().then_some(coords))
    }
}

/// Cache-first geocoder
#[derive(Clone)]
pub struct Geocoder {
    cache: Arc<GeocodeCache>,
    provider: Option<Arc<dyn GeocodeProvider>>,
    limiter: Arc<RateLimiter>,
}

impl Geocoder {
    pub fn new(
        cache: Arc<GeocodeCache>,
        provider: Option<Arc<dyn GeocodeProvider>>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            cache,
            provider,
            limiter,
        }
    }

    /// Cache-only geocoder; `resolve` never leaves the process
    pub fn offline(cache: Arc<GeocodeCache>) -> Self {
        Self::new(cache, None, Arc::new(RateLimiter::new(Duration::ZERO)))
    }

    pub fn cache(&self) -> &Arc<GeocodeCache> {
        &self.cache
    }

    /// Resolve a city, consulting the provider on a cache miss.
    ///
    /// Queries `"city, country"` and then `"city"` alone. Errors are logged,
    /// and a city that yields nothing is cached as a failure. Without a
    /// provider a miss is returned as `None` and not cached.
    pub async fn resolve(&self, city: &str, country: &str) -> Option<Coordinates> {
        if city.trim().is_empty() {
            return None;
        }
        if let Some(cached) = self.cache.get(city, country) {
            return cached;
        }
        let provider = self.provider.as_ref()?;

        let mut queries = Vec::with_capacity(2);
        if !country.trim().is_empty() {
            queries.push(format!("{}, {}", city.trim(), country.trim()));
        }
        queries.push(city.trim().to_string());

        for query in &queries {
            self.limiter.acquire().await;
            match provider.lookup(query).await {
                Ok(Some(coords)) => {
                    debug!("Geocoded {:?} via {} -> {:?}", query, provider.name(), coords);
                    self.remember(city, country, Some(coords)).await;
                    return Some(coords);
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("Geocode lookup for {:?} failed: {}", query, e);
                    continue;
                }
            }
        }

        self.remember(city, country, None).await;
        None
    }

    async fn remember(&self, city: &str, country: &str, coordinates: Option<Coordinates>) {
        self.cache.insert(city, country, coordinates);
        if let Err(e) = self.cache.persist().await {
            warn!("Failed to persist geocode cache: {}", e);
        }
    }

    pub fn resolve_cached_only(&self, city: &str, country: &str) -> Option<Coordinates> {
        self.cache.resolve_cached_only(city, country)
    }

    /// Geocode every supplier missing coordinates and write results back.
    ///
    /// Returns the number of suppliers that gained coordinates.
    pub async fn warm(&self, suppliers: &mut [Supplier]) -> usize {
        let mut resolved = 0;
        for supplier in suppliers.iter_mut().filter(|s| s.coordinates().is_none()) {
            if let Some(coords) = self.resolve(&supplier.city, &supplier.country).await {
                supplier.latitude = Some(coords.latitude);
                supplier.longitude = Some(coords.longitude);
                resolved += 1;
            }
        }
        let stats = self.cache.stats();
        info!(
            resolved,
            cached = stats.total,
            failed = stats.failed,
            "Geocode cache warmed"
        );
        resolved
    }
}
