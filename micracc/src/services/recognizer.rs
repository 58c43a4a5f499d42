//! Recognition collaborators
//!
//! The pipeline treats recognition as opaque: image bytes in, a map of
//! engine name to field strings out. Two backends exist, selected at
//! startup: delegation to a remote recognition service over HTTP, or a
//! preloaded fixture document for offline runs.

use micracc_common::micr::RecognitionOutcome;
use micracc_common::{CheckId, Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error as ThisError;

const USER_AGENT: &str = concat!("micracc/", env!("CARGO_PKG_VERSION"));

/// Remote recognition errors
#[derive(Debug, ThisError)]
pub enum RecognizeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Recognition service error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<RecognizeError> for Error {
    fn from(err: RecognizeError) -> Self {
        Error::Recognition(err.to_string())
    }
}

/// Produces a recognition outcome for one check image
#[allow(async_fn_in_trait)]
pub trait Recognizer {
    async fn recognize(&self, id: CheckId, image: &[u8]) -> Result<RecognitionOutcome>;
}

/// Delegates recognition to a remote service.
///
/// Same request/response contract as running locally; the image bytes
/// travel in the request body and the per-engine results come back as
/// JSON.
pub struct RemoteRecognizer {
    http_client: reqwest::Client,
    base_url: String,
}

impl RemoteRecognizer {
    pub fn new(base_url: String, timeout: Duration) -> std::result::Result<Self, RecognizeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RecognizeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint_for(&self, id: CheckId) -> String {
        format!("{}/recognize/{}", self.base_url, id)
    }

    async fn submit(
        &self,
        id: CheckId,
        image: &[u8],
    ) -> std::result::Result<RecognitionOutcome, RecognizeError> {
        tracing::debug!(check = id, bytes = image.len(), "Submitting check for recognition");

        let response = self
            .http_client
            .post(self.endpoint_for(id))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| RecognizeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecognizeError::Api(status.as_u16(), error_text));
        }

        response
            .json::<RecognitionOutcome>()
            .await
            .map_err(|e| RecognizeError::Parse(e.to_string()))
    }
}

impl Recognizer for RemoteRecognizer {
    async fn recognize(&self, id: CheckId, image: &[u8]) -> Result<RecognitionOutcome> {
        Ok(self.submit(id, image).await?)
    }
}

/// Serves recognition outcomes from a preloaded JSON document
/// (check id to per-engine results). Stands in for the local engine
/// path and keeps tests off the network.
pub struct FixtureRecognizer {
    outcomes: BTreeMap<CheckId, RecognitionOutcome>,
}

#[derive(Deserialize)]
struct FixtureDocument(BTreeMap<CheckId, RecognitionOutcome>);

impl FixtureRecognizer {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read recognition fixtures {}: {}",
                path.display(),
                e
            ))
        })?;
        let FixtureDocument(outcomes) = serde_json::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "Failed to parse recognition fixtures {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            checks = outcomes.len(),
            "Loaded recognition fixtures from {}",
            path.display()
        );
        Ok(Self { outcomes })
    }

    pub fn from_outcomes(outcomes: BTreeMap<CheckId, RecognitionOutcome>) -> Self {
        Self { outcomes }
    }
}

impl Recognizer for FixtureRecognizer {
    async fn recognize(&self, id: CheckId, _image: &[u8]) -> Result<RecognitionOutcome> {
        self.outcomes
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no fixture outcome for check {}", id)))
    }
}

/// Backend selected by configuration at startup
pub enum AnyRecognizer {
    Remote(RemoteRecognizer),
    Fixture(FixtureRecognizer),
}

impl Recognizer for AnyRecognizer {
    async fn recognize(&self, id: CheckId, image: &[u8]) -> Result<RecognitionOutcome> {
        match self {
            AnyRecognizer::Remote(remote) => remote.recognize(id, image).await,
            AnyRecognizer::Fixture(fixture) => fixture.recognize(id, image).await,
        }
    }
}
