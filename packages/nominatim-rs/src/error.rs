use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Nominatim answered with a non-success status code.
    #[error("Nominatim returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A result carried a latitude/longitude that did not parse as a float.
    #[error("invalid coordinate in Nominatim response: {0}")]
    Coordinate(#[from] std::num::ParseFloatError),
}
