//! Minimal Nominatim (OpenStreetMap) geocoding client.
//!
//! Supports free-text search with a bounded per-request timeout. Nominatim's
//! usage policy requires an identifying `User-Agent`, so the client takes one
//! at construction and sends it on every request.
//!
//! # Example
//!
//! ```rust,ignore
//! use nominatim::Client;
//!
//! let client = Client::new("MyApp/1.0 (listings platform)".into());
//! let places = client.search("10 Downing Street, London", 1).await?;
//! if let Some(place) = places.first() {
//!     println!("{} {}", place.lat, place.lon);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::Place;

use std::time::Duration;

use tracing::{debug, instrument};

const BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Default per-request timeout. Nominatim is a shared, rate-limited service;
/// an unresponsive upstream must not stall callers indefinitely.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Client {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl Client {
    pub fn new(user_agent: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            user_agent,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at a different server. Used by tests and by
    /// deployments running their own Nominatim instance.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Free-text search. Returns zero or more candidates, best match first.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Place>> {
        let url = format!(
            "{}/search?q={}&format=json&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );

        debug!("Searching Nominatim for: {}", query);

        let resp = self
            .http
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let places: Vec<Place> = resp.json().await?;
        debug!(count = places.len(), "Nominatim search complete");
        Ok(places)
    }
}
