//! Client for the remote hall recognition endpoint.
//!
//! One multipart `POST` per scan. At most one request is in flight per
//! client; a second scan while one is outstanding is refused without
//! touching the network.

use crate::capture::ImagePayload;
use hallnav_protocol::defaults::{RECOGNIZE_PATH, UPLOAD_FIELD_NAME};
use hallnav_protocol::RecognitionResult;
use reqwest::multipart::{Form, Part};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const NOT_RECOGNIZED_MESSAGE: &str = "Image not recognized. Try again.";
pub const RECOGNIZED_MESSAGE: &str = "Recognized!";
pub const BUSY_MESSAGE: &str = "A scan is already in progress.";

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("A recognition request is already in flight")]
    Busy,

    #[error("Invalid recognition endpoint '{0}'")]
    Endpoint(String),

    #[error("Recognition service error: {message}")]
    Service { status: u16, message: String },

    #[error("Recognition service unreachable: {message}")]
    Transport { message: String, timed_out: bool },
}

impl RecognitionError {
    pub fn user_message(&self) -> String {
        match self {
            RecognitionError::Busy => BUSY_MESSAGE.to_string(),
            RecognitionError::Service { message, .. } => message.clone(),
            RecognitionError::Endpoint(_) | RecognitionError::Transport { .. } => {
                NOT_RECOGNIZED_MESSAGE.to_string()
            }
        }
    }

    /// The service could not be reached at all.
    pub fn is_offline(&self) -> bool {
        matches!(self, RecognitionError::Transport { .. })
    }
}

/// What a completed (2xx) request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// `status == "success"`.
    Recognized(RecognitionResult),
    /// Any other body. Displayed raw; the flow stays on the home page.
    Rejected { raw: String },
}

#[derive(Debug, Clone)]
pub struct RecognitionClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

impl RecognitionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecognitionError> {
        let raw = format!("{}{}", base_url.trim().trim_end_matches('/'), RECOGNIZE_PATH);
        let endpoint = Url::parse(&raw).map_err(|_| RecognitionError::Endpoint(raw.clone()))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RecognitionError::Endpoint(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The scan trigger is disabled while this is true.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn recognize(&self, payload: &ImagePayload) -> Result<ScanOutcome, RecognitionError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(RecognitionError::Busy)?;

        let part = Part::bytes(payload.bytes().to_vec())
            .file_name(payload.upload_filename().to_string())
            .mime_str(payload.content_type())
            .map_err(|e| transport(&e))?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        debug!(
            "POST {} ({} bytes, {})",
            self.endpoint,
            payload.bytes().len(),
            payload.upload_filename()
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport(&e))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| NOT_RECOGNIZED_MESSAGE.to_string());
            warn!("Recognition failed with HTTP {}: {}", status.as_u16(), message);
            return Err(RecognitionError::Service {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<RecognitionResult>(&body) {
            Ok(result) if result.status.is_success() => {
                info!(
                    "Recognized hall '{}' (confidence {:.2})",
                    result.hall_id,
                    result.confidence()
                );
                Ok(ScanOutcome::Recognized(result))
            }
            Ok(result) => {
                debug!("Recognition returned status {}", result.status);
                Ok(ScanOutcome::Rejected { raw: body })
            }
            Err(e) => {
                debug!("Unparseable recognition body: {}", e);
                Ok(ScanOutcome::Rejected { raw: body })
            }
        }
    }
}

/// Holds the single in-flight slot; released on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn transport(e: &reqwest::Error) -> RecognitionError {
    warn!("Recognition transport error: {}", e);
    RecognitionError::Transport {
        message: e.to_string(),
        timed_out: e.is_timeout(),
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = RecognitionClient::new("http://localhost:8000/", Duration::from_secs(30)).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:8000/api/recognize_hall/"
        );
        assert!(RecognitionClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"error":"Hall not in dataset"}"#).as_deref(),
            Some("Hall not in dataset")
        );
        assert_eq!(error_message(r#"{"error":"  "}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = InFlightGuard::acquire(&flag).unwrap();
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_user_messages() {
        let err = RecognitionError::Service {
            status: 400,
            message: "Blurry image".into(),
        };
        assert_eq!(err.user_message(), "Blurry image");
        assert!(!err.is_offline());

        let err = RecognitionError::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert_eq!(err.user_message(), NOT_RECOGNIZED_MESSAGE);
        assert!(err.is_offline());
    }
}
