//! HTTP client for the server's REST collaborators: image details, the
//! identity list and face training submissions.
//!
//! The server serializes its records without JSON tags, so field names may
//! arrive as `ID`/`Name` or `id`/`name`; both are accepted.

use chrono::{DateTime, Utc};
use facefeed_core::{ImageId, Notification, NotificationSink, Severity};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shown for any collaborator failure; details go to the log.
pub const GENERIC_FAILURE: &str = "The request failed. Please try again.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("server answered {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(alias = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDetail {
    #[serde(alias = "Identity")]
    pub identity: Identity,
    #[serde(alias = "Confidence", default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceDetail {
    #[serde(alias = "ID")]
    pub id: u64,
    #[serde(alias = "Confidence", default)]
    pub confidence: f64,
    #[serde(alias = "Matches", default)]
    pub matches: Option<Vec<MatchDetail>>,
}

/// Full image record with nested faces and matches.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageDetail {
    #[serde(alias = "ID")]
    pub id: ImageId,
    #[serde(alias = "FilePath", default)]
    pub file_path: String,
    #[serde(alias = "Source", default)]
    pub source: String,
    #[serde(alias = "Timestamp", default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "Faces", default)]
    pub faces: Option<Vec<FaceDetail>>,
}

impl ImageDetail {
    pub fn faces(&self) -> &[FaceDetail] {
        self.faces.as_deref().unwrap_or_default()
    }
}

/// Assign one detected face to a known identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingRequest {
    pub identity_id: u64,
    pub image_id: ImageId,
    pub face_id: u64,
}

#[derive(Serialize)]
struct TrainingBody {
    identity_id: u64,
    image_id: ImageId,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(http, base))
    }

    pub fn with_client(http: reqwest::Client, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { http, base }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    pub async fn image_detail(&self, id: ImageId) -> Result<ImageDetail, ApiError> {
        let url = self.endpoint(&format!("api/images/{id}"))?;
        tracing::debug!(%url, "fetching image detail");
        let response = check(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn identities(&self) -> Result<Vec<Identity>, ApiError> {
        let url = self.endpoint("api/identities")?;
        tracing::debug!(%url, "fetching identities");
        let response = check(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Submit a training assignment; returns the server's confirmation message.
    pub async fn submit_training(&self, request: &TrainingRequest) -> Result<String, ApiError> {
        let url = self.endpoint(&format!("api/faces/{}/train-compreface", request.face_id))?;
        tracing::info!(
            identity_id = request.identity_id,
            image_id = request.image_id,
            face_id = request.face_id,
            "submitting training"
        );
        let body = TrainingBody {
            identity_id: request.identity_id,
            image_id: request.image_id,
        };
        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let reply: TrainingReply = serde_json::from_str(&text).unwrap_or_default();

        if status.is_success() && reply.success {
            Ok(reply.message.unwrap_or_else(|| "Training submitted".to_string()))
        } else if let Some(error) = reply.error {
            Err(ApiError::Rejected(error))
        } else {
            Err(ApiError::Status {
                status,
                message: text,
            })
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, message })
}

/// Report the outcome of a user-initiated collaborator call to `sink`.
///
/// Failures are never swallowed: they show a generic message and are logged.
pub fn report<T, N: NotificationSink>(
    sink: &mut N,
    action: &str,
    result: &Result<T, ApiError>,
    success_message: impl FnOnce(&T) -> String,
) {
    match result {
        Ok(value) => sink.notify(Notification::new(action, success_message(value), Severity::Success)),
        Err(err) => report_failure(sink, action, err),
    }
}

pub fn report_failure<N: NotificationSink>(sink: &mut N, action: &str, err: &ApiError) {
    tracing::warn!(action, error = %err, "collaborator request failed");
    sink.notify(Notification::new(action, GENERIC_FAILURE, Severity::Danger));
}
