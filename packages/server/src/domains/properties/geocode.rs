//! Address-to-coordinate resolution for listing writes.
//!
//! When a listing's address changes, a cascade of geocoding lookups runs
//! from most to least specific. The first query with a result wins and
//! carries a zoom hint for the map display; the guaranteed country-level
//! fallback means the cascade terminates with a result whenever the
//! geocoding service is reachable at all. A cascade that still resolves
//! nothing, or fails in transport, aborts the triggering write.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Zoom hints by cascade position: building, street, city, country level.
const ZOOM_LEVELS: [i32; 4] = [17, 16, 13, 7];

/// Upper bound on one full cascade (up to four sequential lookups, each with
/// its own client-side timeout).
const CASCADE_DEADLINE: Duration = Duration::from_secs(25);

/// The address components that drive geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub house_number: String,
    pub street: String,
    pub city: String,
}

/// A resolved map position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub zoom: i32,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Every cascade level, including the country fallback, came back empty.
    #[error("no coordinates found for the provided address")]
    Unresolvable,

    #[error("geocoding lookup failed: {0}")]
    Upstream(#[from] nominatim::Error),

    #[error("geocoding cascade exceeded its deadline")]
    DeadlineExceeded,
}

/// Boundary to the external geocoding service.
///
/// The resolver only needs text search; keeping the seam this narrow lets
/// tests drive the cascade with stubs.
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<nominatim::Place>, nominatim::Error>;
}

#[async_trait]
impl GeocodeLookup for nominatim::Client {
    async fn search(&self, query: &str) -> Result<Vec<nominatim::Place>, nominatim::Error> {
        nominatim::Client::search(self, query, 1).await
    }
}

/// Runs the fallback cascade against a geocoding backend.
pub struct AddressResolver {
    geocoder: Arc<dyn GeocodeLookup>,
    country: String,
    fallback_city: String,
}

impl AddressResolver {
    pub fn new(geocoder: Arc<dyn GeocodeLookup>, country: String, fallback_city: String) -> Self {
        Self {
            geocoder,
            country,
            fallback_city,
        }
    }

    /// The four candidate queries, most specific first. The last entry is a
    /// fixed country-level default, so the cascade always has somewhere to
    /// land.
    fn candidate_queries(&self, address: &Address) -> [String; 4] {
        [
            format!(
                "{}, {}, {}, {}",
                address.house_number, address.street, address.city, self.country
            ),
            format!("{}, {}, {}", address.street, address.city, self.country),
            format!("{}, {}", address.city, self.country),
            format!("{}, {}", self.fallback_city, self.country),
        ]
    }

    /// Resolve an address to coordinates and a zoom hint.
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &Address) -> Result<GeoPoint, GeocodeError> {
        tokio::time::timeout(CASCADE_DEADLINE, self.run_cascade(address))
            .await
            .map_err(|_| GeocodeError::DeadlineExceeded)?
    }

    async fn run_cascade(&self, address: &Address) -> Result<GeoPoint, GeocodeError> {
        // Strictly sequential: a hit at position i must win over anything a
        // less specific query would return, and a hit stops further calls to
        // the rate-limited upstream.
        for (position, query) in self.candidate_queries(address).iter().enumerate() {
            let places = self.geocoder.search(query).await?;
            let Some(place) = places.first() else {
                debug!(%query, position, "No geocoding match, falling back");
                continue;
            };

            let point = GeoPoint {
                lat: truncate_coord(place.latitude()?),
                lng: truncate_coord(place.longitude()?),
                zoom: ZOOM_LEVELS[position],
            };
            debug!(%query, position, lat = point.lat, lng = point.lng, "Address resolved");
            return Ok(point);
        }

        warn!(city = %address.city, "Address unresolvable at every cascade level");
        Err(GeocodeError::Unresolvable)
    }
}

/// Resolve only when an address component actually changed.
///
/// Returns `Ok(None)` without touching the geocoding service when the
/// address is identical to the previously stored one, preserving the
/// existing coordinates.
pub async fn resolve_if_changed(
    resolver: &AddressResolver,
    previous: Option<&Address>,
    current: &Address,
) -> Result<Option<GeoPoint>, GeocodeError> {
    if previous == Some(current) {
        return Ok(None);
    }
    resolver.resolve(current).await.map(Some)
}

/// Truncate toward zero to 5 decimal places (~1m of precision).
pub fn truncate_coord(value: f64) -> f64 {
    (value * 100_000.0).trunc() / 100_000.0
}
