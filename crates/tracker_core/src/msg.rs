use crate::{FormatChoice, JobId, PreviewId, Quality, TimerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box.
    InputChanged(String),
    /// User picked a different output format; resets the quality choice.
    FormatChanged(FormatChoice),
    QualityChanged(Quality),
    /// User clicked Preview.
    PreviewClicked,
    /// User submitted the download form.
    SubmitClicked,
    /// A timer armed through [`crate::Effect::ArmTimer`] fired.
    TimerFired(TimerId),
    /// Outcome of one job status request. `Err` carries a transport failure.
    StatusPolled {
        job_id: JobId,
        result: Result<StatusReport, String>,
    },
    /// Outcome of a metadata request. `Err` carries the text to show the user.
    PreviewFetched {
        preview_id: PreviewId,
        result: Result<VideoInfo, String>,
    },
    /// The page is going away; release every timer.
    Teardown,
}

/// One decoded answer from the job status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// `None` when the field was absent or malformed.
    pub progress: Option<u8>,
    pub status: ReportedStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Pending,
    Downloading,
    Complete,
    Error,
    /// Anything else the server sent; treated as still in progress.
    Other(String),
}

impl ReportedStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => ReportedStatus::Pending,
            "downloading" => ReportedStatus::Downloading,
            "complete" => ReportedStatus::Complete,
            "error" => ReportedStatus::Error,
            _ => ReportedStatus::Other(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub video_id: Option<String>,
    pub title: String,
}
