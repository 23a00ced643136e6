//! Tracker core: pure state machine for download jobs and previews.
//!
//! All timing and IO is expressed as [`Effect`]s; the driver feeds results
//! back in as [`Msg`]s. Given the same seed and message sequence the state
//! machine behaves identically.
mod config;
mod effect;
mod form;
mod job;
mod msg;
mod poll;
mod preview;
mod progress;
mod state;
mod submission;
mod timer;
mod update;
mod view_model;

pub use config::{ConfigError, TrackerConfig};
pub use effect::Effect;
pub use form::{
    check_url, quality_options, thumbnail_url, DownloadForm, FormatChoice, PreviewQuery, Quality,
    QualityOption, UrlCheck, INVALID_URL_MESSAGE,
};
pub use job::{Job, JobId, JobStatus};
pub use msg::{Msg, ReportedStatus, StatusReport, VideoInfo};
pub use poll::{JobFinished, ProgressController};
pub use preview::{PreviewController, PreviewId};
pub use progress::{
    simulation_step, MergeOutcome, ProgressTrack, ProgressUpdate, SimulationPhase, COMPLETE,
};
pub use state::AppState;
pub use submission::SubmissionController;
pub use timer::{Schedule, TimerId, TimerKind};
pub use update::update;
pub use view_model::{AppViewModel, JobView, PreviewResult, ProgressView};
