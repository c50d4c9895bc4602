//! National Weather Service HTTP client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::{AlertCollection, Forecast, Point};

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const USER_AGENT: &str = "weather-app/1.0";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client over the public NWS API.
#[derive(Debug, Clone)]
pub struct NwsClient {
    client: reqwest::Client,
    base: String,
}

impl NwsClient {
    pub fn new() -> Result<Self> {
        Self::with_base(NWS_API_BASE, REQUEST_TIMEOUT)
    }

    /// Point at another API root (a local fixture server, for instance).
    pub fn with_base(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Active alerts for a two-letter state code.
    pub async fn alerts(&self, state: &str) -> Result<AlertCollection> {
        let url = format!("{}/alerts/active/area/{}", self.base, state);
        self.get(&url).await
    }

    /// Grid point metadata, which links to the forecast.
    pub async fn point(&self, latitude: f64, longitude: f64) -> Result<Point> {
        let url = format!("{}/points/{latitude},{longitude}", self.base);
        self.get(&url).await
    }

    /// Follow a forecast link returned by [`point`](Self::point).
    pub async fn forecast(&self, url: &str) -> Result<Forecast> {
        self.get(url).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "nws request");
        let response = self
            .client
            .get(url)
            .header("accept", "application/geo+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}
