use crate::config::{FetchConfig, LocationConfig};
use crate::error::{RefreshError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub struct VentuskyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl VentuskyClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn page_url(&self, latitude: f64, longitude: f64) -> String {
        format!("{}/{};{}", self.base_url, latitude, longitude)
    }

    /// Download the forecast page for a position
    pub async fn fetch_page(&self, latitude: f64, longitude: f64) -> std::result::Result<String, RefreshError> {
        let url = self.page_url(latitude, longitude);
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(RefreshError::NetworkFailure(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response.text().await.map_err(|e| self.classify(e))
    }

    /// Reachability check used when validating a location
    pub async fn test_connection(&self, location: &LocationConfig) -> Result<bool> {
        let response = self
            .client
            .get(self.page_url(location.latitude, location.longitude))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    fn classify(&self, err: reqwest::Error) -> RefreshError {
        if err.is_timeout() {
            RefreshError::Timeout(self.timeout.as_secs())
        } else {
            RefreshError::NetworkFailure(err.to_string())
        }
    }
}

/// Where a coordinator reads its page from
pub enum PageSource {
    Http {
        client: VentuskyClient,
        latitude: f64,
        longitude: f64,
    },
    File(PathBuf),
}

impl PageSource {
    pub fn http(client: VentuskyClient, location: &LocationConfig) -> Self {
        PageSource::Http {
            client,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    pub async fn fetch(&self) -> std::result::Result<String, RefreshError> {
        match self {
            PageSource::Http {
                client,
                latitude,
                longitude,
            } => client.fetch_page(*latitude, *longitude).await,
            PageSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                RefreshError::NetworkFailure(format!("reading {}: {}", path.display(), e))
            }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PageSource::Http {
                client,
                latitude,
                longitude,
            } => client.page_url(*latitude, *longitude),
            PageSource::File(path) => path.display().to_string(),
        }
    }
}
