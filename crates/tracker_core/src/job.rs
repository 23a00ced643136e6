use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::progress::ProgressTrack;

const JOB_ID_LEN: usize = 12;

/// Client-generated identifier of one download job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    /// Draws a short random alphanumeric token.
    pub fn mint<R: Rng>(rng: &mut R) -> Self {
        let token: String = rng
            .sample_iter(&Alphanumeric)
            .take(JOB_ID_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Polling,
    Complete,
    Error,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error | JobStatus::TimedOut)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Polling => 1,
            JobStatus::Complete | JobStatus::Error | JobStatus::TimedOut => 2,
        }
    }
}

/// Per-job state owned by the progress controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    progress: ProgressTrack,
    consecutive_poll_failures: u32,
    message: String,
    ticks: u64,
    awaiting_poll: bool,
}

impl Job {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: ProgressTrack::default(),
            consecutive_poll_failures: 0,
            message: String::new(),
            ticks: 0,
            awaiting_poll: false,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn displayed_progress(&self) -> u8 {
        self.progress.displayed()
    }

    pub fn last_server_progress(&self) -> u8 {
        self.progress.last_server()
    }

    pub fn consecutive_poll_failures(&self) -> u32 {
        self.consecutive_poll_failures
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Moves the status forward. Returns `false` for any backward or
    /// post-terminal transition, leaving the status untouched.
    pub(crate) fn advance(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() || next.rank() <= self.status.rank() {
            return false;
        }
        self.status = next;
        true
    }

    pub(crate) fn progress(&self) -> &ProgressTrack {
        &self.progress
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressTrack {
        &mut self.progress
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub(crate) fn record_tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    /// Marks a status request as sent. Returns whether the previous one was
    /// still unanswered.
    pub(crate) fn poll_sent(&mut self) -> bool {
        std::mem::replace(&mut self.awaiting_poll, true)
    }

    /// Marks the outstanding request as answered. Returns whether one was
    /// outstanding.
    pub(crate) fn poll_answered(&mut self) -> bool {
        std::mem::replace(&mut self.awaiting_poll, false)
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_poll_failures = self.consecutive_poll_failures.saturating_add(1);
        self.consecutive_poll_failures
    }

    pub(crate) fn reset_failures(&mut self) {
        self.consecutive_poll_failures = 0;
    }
}
