use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    /// Non-2xx answer whose body carried a message meant for the user.
    Rejected(u16),
    Timeout,
    Network,
    /// Body was not the JSON shape the endpoint promises.
    Decode,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Rejected(code) => write!(f, "rejected with status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text shown to the user when a preview fails.
    pub fn preview_text(&self) -> String {
        match self.kind {
            FailureKind::Rejected(_) => self.message.clone(),
            FailureKind::HttpStatus(code) => {
                format!("Could not load video info (server answered {code}).")
            }
            FailureKind::Timeout => "Could not load video info (request timed out).".to_string(),
            _ => format!("Could not load video info ({}).", self.kind),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ClientError::new(FailureKind::Timeout, err.to_string());
        }
        if err.is_builder() {
            return ClientError::new(FailureKind::InvalidUrl, err.to_string());
        }
        if err.is_decode() {
            return ClientError::new(FailureKind::Decode, err.to_string());
        }
        ClientError::new(FailureKind::Network, err.to_string())
    }
}
