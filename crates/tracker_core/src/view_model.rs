use crate::{FormatChoice, JobId, JobStatus, Quality, QualityOption};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub message: String,
}

/// Metadata revealed after a successful preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResult {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub format_label: &'static str,
    pub quality_label: &'static str,
}

impl PreviewResult {
    /// "Video MP4 - high quality" style summary line.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.format_label, self.quality_label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub displayed_progress: u8,
    pub last_server_progress: u8,
    pub consecutive_poll_failures: u32,
    pub simulating: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub url: String,
    pub format: FormatChoice,
    pub quality: Quality,
    pub quality_options: Vec<QualityOption>,
    pub submit_enabled: bool,
    pub preview_enabled: bool,
    /// `None` while the progress area is hidden.
    pub progress: Option<ProgressView>,
    pub error_text: Option<String>,
    pub preview: Option<PreviewResult>,
    pub completed_job: Option<JobId>,
    pub job: Option<JobView>,
    pub dirty: bool,
}
