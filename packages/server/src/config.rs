use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Override for self-hosted Nominatim instances; the public server
    /// otherwise.
    pub nominatim_base_url: Option<String>,
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub nominatim_user_agent: String,
    /// Country suffix appended to every geocoding query.
    pub geocode_country: String,
    /// City used for the guaranteed country-level fallback query.
    pub geocode_fallback_city: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            nominatim_base_url: env::var("NOMINATIM_BASE_URL").ok(),
            nominatim_user_agent: env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| "KeysideRealty/1.0 (listings platform)".to_string()),
            geocode_country: env::var("GEOCODE_COUNTRY")
                .unwrap_or_else(|_| "Israel".to_string()),
            geocode_fallback_city: env::var("GEOCODE_FALLBACK_CITY")
                .unwrap_or_else(|_| "Jerusalem".to_string()),
        })
    }
}
