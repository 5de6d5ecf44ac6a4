//! Client for the external phishing classification service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/analyze";

#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    pub text: &'a str,
}

/// The classifier's verdict for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AnalysisResult {
    pub is_phishing: bool,
    /// Phishing probability as a percentage, `0..=100`.
    pub confidence_score: f64,
}

impl AnalysisResult {
    /// Reject scores that are not a finite percentage.
    pub fn validate(self) -> Result<Self, AnalysisError> {
        if !self.confidence_score.is_finite() || !(0.0..=100.0).contains(&self.confidence_score) {
            return Err(AnalysisError::InvalidResponse {
                details: format!(
                    "confidence_score {} is outside 0..=100",
                    self.confidence_score
                ),
            });
        }
        Ok(self)
    }
}

/// Body the backend sends with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("analysis server returned {status}: {message}")]
    Server {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("invalid response from analysis server: {details}")]
    InvalidResponse { details: String },
}

impl AnalysisError {
    /// Failures that mean the server could not be talked to properly, as
    /// opposed to the server answering with something unusable.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            AnalysisError::Network(_) | AnalysisError::Server { .. }
        )
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError>;
}

/// POSTs `{"text": ...}` to the analysis endpoint and reads back a verdict.
pub struct HttpClassifier {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Self {
        // The stock backend has no timeout, so none is set unless configured
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            chars = text.chars().count(),
            "sending text for analysis"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AnalysisRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ServerErrorBody>(&body) {
                Ok(err) => err.error,
                Err(_) if !body.trim().is_empty() => body.trim().to_string(),
                Err(_) => status.canonical_reason().unwrap_or("no details").to_string(),
            };
            return Err(AnalysisError::Server { status, message });
        }

        let result: AnalysisResult =
            serde_json::from_str(&body).map_err(|e| AnalysisError::InvalidResponse {
                details: e.to_string(),
            })?;

        result.validate()
    }
}
