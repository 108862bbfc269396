use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::TransportError;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Status and body of a provider response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// The JSON payload on success; the decimal status code (e.g. `"404"`) otherwise.
    pub body: String,
}

impl RawResponse {
    /// Build from a received response, replacing the body of non-2xx answers
    /// with the status code text.
    pub fn from_status(status: u16, body: String) -> Self {
        if (200..300).contains(&status) {
            Self { status, body }
        } else {
            Self { status, body: status.to_string() }
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of current-weather payloads for a city name.
///
/// Implementations hold only immutable configuration and may be shared
/// between concurrent callers.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fails only on transport errors; HTTP error statuses come back as a [`RawResponse`].
    async fn fetch(&self, city: &str) -> Result<RawResponse, TransportError>;
}
