use anyhow::{Context, Result};
use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::outcome::ClassificationOutcome;

/// Classification boundary between the UI and the prediction service.
///
/// The session and live-analysis components talk to this trait so tests
/// can substitute a scripted classifier for the real HTTP client.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify_text(&self, message: &str) -> ClassificationOutcome;

    async fn classify_audio(&self, wav_bytes: Vec<u8>, filename: &str) -> ClassificationOutcome;
}

/// Service health as reported by `GET /health`.
#[derive(Debug, Deserialize)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
}

/// HTTP client for the prediction service.
///
/// Each classify call performs exactly one round trip; there are no
/// retries. Failures of any kind are folded into the returned outcome.
pub struct PredictionClient {
    http: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe the service before first use.
    pub async fn health(&self) -> Result<HealthReport> {
        let url = format!("{}/health", self.base_url);

        let report = self
            .http
            .get(&url)
            .send()
            .await
            .context("Health check request failed")?
            .json::<HealthReport>()
            .await
            .context("Health check returned an unreadable body")?;

        info!(
            "Service health: ok={}, model={:?}, audio={:?}",
            report.ok, report.model, report.audio
        );

        Ok(report)
    }

    /// Decode a prediction response, folding every failure into an outcome.
    ///
    /// The service reports its own errors as JSON bodies with `ok: false`
    /// (often alongside a non-2xx status), so the body is decoded before
    /// the status is consulted.
    async fn decode(response: reqwest::Response) -> ClassificationOutcome {
        let status = response.status();

        match response.json::<ClassificationOutcome>().await {
            Ok(outcome) => outcome.normalized(),
            Err(e) => {
                warn!("Undecodable response from service (status {}): {}", status, e);
                ClassificationOutcome::failure(format!(
                    "Service returned an unreadable response (status {})",
                    status
                ))
            }
        }
    }
}

#[async_trait::async_trait]
impl Classifier for PredictionClient {
    async fn classify_text(&self, message: &str) -> ClassificationOutcome {
        let url = format!("{}/predict-text", self.base_url);

        info!("Classifying text ({} chars)", message.len());

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await;

        match response {
            Ok(res) => Self::decode(res).await,
            Err(e) => {
                warn!("Text classification request failed: {}", e);
                ClassificationOutcome::failure(e.to_string())
            }
        }
    }

    async fn classify_audio(&self, wav_bytes: Vec<u8>, filename: &str) -> ClassificationOutcome {
        let url = format!("{}/predict-audio", self.base_url);

        info!(
            "Classifying audio: {} ({} bytes)",
            filename,
            wav_bytes.len()
        );

        let part = multipart::Part::bytes(wav_bytes).file_name(filename.to_string());
        let form = multipart::Form::new().part("audio", part);

        let response = self.http.post(&url).multipart(form).send().await;

        match response {
            Ok(res) => Self::decode(res).await,
            Err(e) => {
                warn!("Audio classification request failed: {}", e);
                ClassificationOutcome::failure(e.to_string())
            }
        }
    }
}
