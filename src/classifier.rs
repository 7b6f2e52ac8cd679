//! Provider classifier - the external service that maps a URL to a cloud.
//!
//! Only the wire contract lives here: `POST {"url": ...}` answered by
//! `{"provider": ...}` on success. Any non-2xx status is a failure and its
//! body is not inspected.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClassifierError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectResponse {
    pub provider: String,
}

/// Anything that can tell which cloud a URL runs on.
///
/// Returns the raw label; mapping it onto `Provider` is the caller's job.
#[async_trait]
pub trait ProviderClassifier: Send + Sync {
    async fn classify(&self, url: &str) -> Result<String, ClassifierError>;
}

/// HTTP client for a detection endpoint
pub struct HttpClassifier {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cloud-dependency-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProviderClassifier for HttpClassifier {
    async fn classify(&self, url: &str) -> Result<String, ClassifierError> {
        debug!("Classifying {} via {}", url, self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&DetectRequest {
                url: url.to_string(),
            })
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Classifier returned {} for {}", status, url);
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body: DetectResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedBody(e.to_string()))?;

        debug!("Classifier says {} for {}", body.provider, url);
        Ok(body.provider)
    }
}
