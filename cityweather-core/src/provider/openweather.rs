use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{config::ProviderSettings, error::TransportError};

use super::{RawResponse, WeatherProvider};

/// Client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self { api_key: settings.api_key, base_url: settings.base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<RawResponse, TransportError> {
        debug!(city, url = %self.base_url, "requesting current weather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(city, status = status.as_u16(), body = %truncate_body(&body), "weather provider returned an error");
        }

        Ok(RawResponse::from_status(status.as_u16(), body))
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
