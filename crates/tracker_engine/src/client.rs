use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, COOKIE, REFERER};
use serde::Deserialize;
use serde_json::Value;
use tracker_core::{DownloadForm, JobId, PreviewQuery, ReportedStatus, StatusReport, VideoInfo};
use tracker_logging::{tracker_debug, tracker_info};
use url::Url;

use crate::filename::attachment_filename;
use crate::persist::AtomicFileWriter;
use crate::{ClientError, FailureKind};

const CSRF_HEADER: &str = "X-CSRFToken";
const CSRF_FIELD: &str = "csrfmiddlewaretoken";
const METADATA_PATH: &str = "get_video_info/";
const STATUS_PATH: &str = "check_progress/";
const SUBMIT_PATH: &str = "download/";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Anti-forgery token sent with every POST.
    pub csrf_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Per-request limit for status polls; kept within a few poll ticks.
    pub status_timeout: Duration,
    /// Submission requests wait for the whole conversion, so they get their
    /// own, much longer timeout.
    pub submit_timeout: Duration,
    pub output_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            csrf_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_secs(5),
            submit_timeout: Duration::from_secs(30 * 60),
            output_dir: PathBuf::from("downloads"),
        }
    }
}

/// Job status endpoint.
#[async_trait::async_trait]
pub trait StatusClient: Send + Sync {
    async fn check_progress(&self, job_id: &JobId) -> Result<StatusReport, ClientError>;
}

/// Video metadata endpoint used by previews.
#[async_trait::async_trait]
pub trait MetadataClient: Send + Sync {
    async fn video_info(&self, query: &PreviewQuery) -> Result<VideoInfo, ClientError>;
}

/// Out-of-band submission. Resolves to the saved attachment's path.
#[async_trait::async_trait]
pub trait SubmissionChannel: Send + Sync {
    async fn submit(&self, job_id: &JobId, form: &DownloadForm) -> Result<PathBuf, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
    writer: AtomicFileWriter,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        let writer = AtomicFileWriter::new(settings.output_dir.clone());
        Ok(Self {
            settings,
            base,
            client,
            writer,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn post(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut request = self
            .client
            .post(self.endpoint(path)?)
            .header(REFERER, self.base.as_str());
        let mut form: Vec<(&str, &str)> = fields.to_vec();
        if let Some(token) = self.settings.csrf_token.as_deref() {
            request = request
                .header(CSRF_HEADER, token)
                .header(COOKIE, format!("csrftoken={token}"));
            form.push((CSRF_FIELD, token));
        }
        Ok(request.form(&form))
    }
}

#[async_trait::async_trait]
impl StatusClient for ReqwestClient {
    async fn check_progress(&self, job_id: &JobId) -> Result<StatusReport, ClientError> {
        let response = self
            .post(STATUS_PATH, &[("download_id", job_id.as_str())])?
            .timeout(self.settings.status_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let body = response.bytes().await?;
        parse_status_report(&body)
    }
}

#[async_trait::async_trait]
impl MetadataClient for ReqwestClient {
    async fn video_info(&self, query: &PreviewQuery) -> Result<VideoInfo, ClientError> {
        let response = self
            .post(
                METADATA_PATH,
                &[
                    ("url", query.url.as_str()),
                    ("format_choice", query.format.wire_value()),
                    ("quality", query.quality.wire_value()),
                ],
            )?
            .timeout(self.settings.request_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(match parse_error_field(&body) {
                Some(message) => ClientError::new(FailureKind::Rejected(status.as_u16()), message),
                None => {
                    ClientError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
                }
            });
        }
        parse_video_info(&body)
    }
}

#[async_trait::async_trait]
impl SubmissionChannel for ReqwestClient {
    async fn submit(&self, job_id: &JobId, form: &DownloadForm) -> Result<PathBuf, ClientError> {
        tracker_info!("submitting job {} for {}", job_id, form.url);
        let response = self
            .post(
                SUBMIT_PATH,
                &[
                    ("url", form.url.as_str()),
                    ("format_choice", form.format.wire_value()),
                    ("quality", form.quality.wire_value()),
                    ("download_id", job_id.as_str()),
                ],
            )?
            .timeout(self.settings.submit_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        if !disposition
            .as_deref()
            .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("attachment"))
        {
            // The server renders its form page again when it rejects a submission.
            return Err(ClientError::new(
                FailureKind::Rejected(status.as_u16()),
                "server answered without an attachment",
            ));
        }

        let filename = attachment_filename(disposition.as_deref(), job_id, form.format);
        let mut pending = self.writer.begin(&filename).map_err(persist_error)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            pending.write_chunk(&chunk?).map_err(persist_error)?;
        }
        tracker_debug!("job {}: received {} bytes", job_id, pending.bytes_written());
        let path = pending.commit().map_err(persist_error)?;
        tracker_info!("job {} saved to {}", job_id, path.display());
        Ok(path)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut base = Url::parse(raw.trim())
        .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(ClientError::new(
            FailureKind::InvalidUrl,
            format!("unsupported scheme {}", base.scheme()),
        ));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

fn persist_error(err: crate::PersistError) -> ClientError {
    ClientError::new(FailureKind::Io, err.to_string())
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    progress: Value,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Decodes a `/check_progress/` body. A missing or malformed `progress`
/// yields `progress: None` rather than an error.
pub fn parse_status_report(body: &[u8]) -> Result<StatusReport, ClientError> {
    let raw: RawStatus = serde_json::from_slice(body)
        .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
    let status = raw
        .status
        .as_deref()
        .map(ReportedStatus::parse)
        .unwrap_or(ReportedStatus::Pending);
    Ok(StatusReport {
        progress: progress_value(&raw.progress),
        status,
        message: raw.message.filter(|message| !message.trim().is_empty()),
    })
}

fn progress_value(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.floor().min(100.0) as u8)
}

#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Decodes a successful `/get_video_info/` body.
pub fn parse_video_info(body: &[u8]) -> Result<VideoInfo, ClientError> {
    let raw: RawVideoInfo = serde_json::from_slice(body)
        .map_err(|err| ClientError::new(FailureKind::Decode, err.to_string()))?;
    Ok(VideoInfo {
        video_id: raw.video_id.filter(|id| !id.trim().is_empty()),
        title: raw
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string()),
    })
}

fn parse_error_field(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value.get("error")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}
