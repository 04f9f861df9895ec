use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::domain::ResourceRecord;
use crate::rate_limiter::{Limits, RateLimiter};

/// External geocoding lookup: free-text query in, coordinates out.
/// `Ok(None)` means the provider had no match; retries for transient
/// failures live inside the adapter, bounded by its max-retries budget.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>>;
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Nominatim adapter. Keyless, so the User-Agent header is the only
/// credential the service asks for.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            max_retries: config.max_retries,
        }
    }

    async fn lookup(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header("User-Agent", "cmhr_refinery/0.1")
            .send()
            .await?;
        let results: Vec<NominatimResult> = resp.json().await?;
        let Some(first) = results.into_iter().next() else {
            return Ok(None);
        };
        let lat: f64 = first.lat.parse()?;
        let lon: f64 = first.lon.parse()?;
        Ok(Some((lat, lon)))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> anyhow::Result<Option<(f64, f64)>> {
        let mut attempt = 0;
        loop {
            match self.lookup(query).await {
                Ok(found) => return Ok(found),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    debug!("Geocoding attempt {} failed, retrying: {}", attempt, e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResolveStats {
    pub queried: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Sequential, rate-limited coordinate backfill. Intentionally not
/// concurrent: the spacing is backpressure on the external service.
pub struct CoordinateResolver {
    geocoder: Arc<dyn Geocoder>,
    limiter: RateLimiter,
    country: String,
}

impl CoordinateResolver {
    pub fn new(config: &GeocodingConfig, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            limiter: RateLimiter::new(Limits {
                requests_per_min: Some(config.requests_per_min),
                concurrency: None,
            }),
            country: config.country.clone(),
        }
    }

    fn query_for(&self, record: &ResourceRecord) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in [
            record.address.as_str(),
            record.city.as_str(),
            record.province.as_str(),
        ] {
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.push(&self.country);
        parts.join(", ")
    }

    /// Backfills coordinates in place, one lookup per record per run.
    /// Records already carrying both coordinates are never re-queried; a
    /// failed lookup leaves both coordinates empty, never one.
    pub async fn resolve(&self, records: &mut [ResourceRecord]) -> ResolveStats {
        let mut stats = ResolveStats::default();
        for record in records.iter_mut() {
            if record.has_coordinates() {
                continue;
            }
            // No partial assignment: clear whatever half-state came in.
            record.latitude = None;
            record.longitude = None;

            stats.queried += 1;
            let query = self.query_for(record);
            let _permit = self.limiter.acquire().await;
            match self.geocoder.geocode(&query).await {
                Ok(Some((lat, lon))) => {
                    record.latitude = Some(lat);
                    record.longitude = Some(lon);
                    stats.resolved += 1;
                }
                Ok(None) => {
                    stats.unresolved += 1;
                    debug!("No geocoding result for '{}'", query);
                }
                Err(e) => {
                    stats.unresolved += 1;
                    warn!("Geocoding failed for '{}': {}", query, e);
                }
            }
        }
        stats
    }
}
