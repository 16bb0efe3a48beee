//! External classification service client
//!
//! The classifier receives raw image bytes and returns a label or an error.
//! The image is forwarded and dropped; only the label is ever persisted, on
//! the identity's `verification_label`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The service could not produce a label from the submitted image
    #[error("classification failed: {0}")]
    Unclassifiable(String),

    /// The service itself was unreachable or answered outside its contract
    #[error("classification service error: {0}")]
    Service(String),
}

/// Classification collaborator consumed by the verification flow.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify raw image bytes, returning the label. The implementation
    /// must not retain the bytes after the call returns.
    async fn classify(&self, image: &[u8], content_type: &str) -> Result<String, ClassifyError>;
}

/// Configuration for the HTTP classifier client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classification service endpoint
    pub service_url: String,
    /// Optional bearer token for the service
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:9090/classify".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: Option<String>,
    error: Option<String>,
}

/// HTTP client for the external classification service.
pub struct HttpClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("veil-gate/0.1")
            .build()
            .map_err(|e| ClassifyError::Service(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &[u8], content_type: &str) -> Result<String, ClassifyError> {
        let mut request = self
            .client
            .post(&self.config.service_url)
            .header("content-type", content_type)
            .body(image.to_vec());

        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifyError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClassifyError::Service(format!(
                "classification service returned {}",
                response.status()
            )));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Service(e.to_string()))?;

        match (body.label, body.error) {
            (Some(label), _) => {
                debug!(label = %label, "Classification succeeded");
                Ok(label)
            }
            (None, Some(error)) => Err(ClassifyError::Unclassifiable(error)),
            (None, None) => Err(ClassifyError::Service(
                "classification service returned neither label nor error".to_string(),
            )),
        }
    }
}
