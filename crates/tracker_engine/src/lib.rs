//! Tracker engine: HTTP clients, timers and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod timer;
mod types;

pub use client::{
    parse_status_report, parse_video_info, ClientSettings, MetadataClient, ReqwestClient,
    StatusClient, SubmissionChannel,
};
pub use engine::{Services, SubmissionOutcome, TrackerEngine, ViewSink};
pub use filename::attachment_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PendingFile, PersistError};
pub use timer::{ManualTimerSource, TimerRegistry, TimerSource, TokioTimerSource};
pub use types::{ClientError, FailureKind};
