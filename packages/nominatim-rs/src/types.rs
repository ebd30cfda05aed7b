use serde::Deserialize;

use crate::error::Result;

/// A single candidate from the Nominatim search endpoint.
///
/// Nominatim serializes coordinates as strings; use [`Place::latitude`] and
/// [`Place::longitude`] to get numeric values.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
}

impl Place {
    pub fn latitude(&self) -> Result<f64> {
        Ok(self.lat.parse()?)
    }

    pub fn longitude(&self) -> Result<f64> {
        Ok(self.lon.parse()?)
    }
}
