use crate::{DownloadForm, JobId, PreviewId, PreviewQuery, Schedule, TimerId, TimerKind};

/// Side effects requested by [`crate::update`]; executed by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a timer that delivers [`crate::Msg::TimerFired`] with this id.
    ArmTimer {
        timer: TimerId,
        kind: TimerKind,
        schedule: Schedule,
    },
    /// Stop a timer. Cancelling an unknown or already finished timer is a no-op.
    CancelTimer { timer: TimerId },
    /// Issue one request to the job status endpoint.
    PollStatus { job_id: JobId },
    /// Issue the metadata request for a preview run.
    FetchPreview {
        preview_id: PreviewId,
        query: PreviewQuery,
    },
    /// Hand the form to the out-of-band submission channel.
    SubmitDownload { job_id: JobId, form: DownloadForm },
}
