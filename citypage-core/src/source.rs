use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::{config::Config, error::WeatherError};

const USER_AGENT: &str = concat!("citypage/", env!("CARGO_PKG_VERSION"));

/// Where XML documents come from.
///
/// `Ok(None)` means the server answered with something other than `200 OK`;
/// callers treat that as "no data" rather than as a failure.
#[async_trait]
pub trait DocumentSource: Send + Sync + Debug {
    async fn fetch(&self, url: &str) -> Result<Option<String>, WeatherError>;
}

/// Fetches documents over HTTP with a single GET, no retries.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
}

impl HttpSource {
    /// Client with the default settings: user agent set, no timeout.
    pub fn new() -> Self {
        let http = Client::builder().user_agent(USER_AGENT).build().unwrap_or_default();
        Self { http }
    }

    /// Build a client honouring the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(WeatherError::HttpClient)?;

        Ok(Self { http })
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Option<String>, WeatherError> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| WeatherError::unavailable(url, err))?;

        let status = res.status();
        if status != StatusCode::OK {
            warn!(%url, %status, "data source answered without data");
            return Ok(None);
        }

        let body = res.text().await.map_err(|err| WeatherError::unavailable(url, err))?;
        debug!(%url, bytes = body.len(), "fetched document");

        Ok(Some(body))
    }
}
