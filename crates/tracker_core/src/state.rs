use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::form::{check_url, quality_options, FormatChoice, Quality, UrlCheck};
use crate::poll::ProgressController;
use crate::preview::PreviewController;
use crate::submission::SubmissionController;
use crate::view_model::{AppViewModel, JobView, PreviewResult, ProgressView};
use crate::{Job, JobId, TimerId, TrackerConfig};

/// What the page shows, mutated by the controllers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct UiState {
    url_valid: bool,
    affordances_locked: bool,
    preview_in_flight: bool,
    progress: Option<ProgressView>,
    error_text: Option<String>,
    preview: Option<PreviewResult>,
    completed_job: Option<JobId>,
    dirty: bool,
}

impl UiState {
    pub fn submit_enabled(&self) -> bool {
        !self.affordances_locked && !self.preview_in_flight
    }

    pub fn preview_enabled(&self) -> bool {
        !self.affordances_locked && self.url_valid
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn set_url_valid(&mut self, valid: bool) {
        self.url_valid = valid;
        self.dirty = true;
    }

    pub fn lock_affordances(&mut self) {
        self.affordances_locked = true;
        self.dirty = true;
    }

    pub fn unlock_affordances(&mut self) {
        self.affordances_locked = false;
        self.dirty = true;
    }

    pub fn set_preview_in_flight(&mut self, in_flight: bool) {
        self.preview_in_flight = in_flight;
        self.dirty = true;
    }

    pub fn show_progress(&mut self, percent: u8, message: impl Into<String>) {
        let next = ProgressView {
            percent,
            message: message.into(),
        };
        if self.progress.as_ref() != Some(&next) {
            self.progress = Some(next);
            self.dirty = true;
        }
    }

    pub fn hide_progress(&mut self) {
        if self.progress.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn set_error(&mut self, text: Option<String>) {
        if self.error_text != text {
            self.error_text = text;
            self.dirty = true;
        }
    }

    pub fn set_preview(&mut self, preview: Option<PreviewResult>) {
        self.preview = preview;
        self.dirty = true;
    }

    pub fn set_completed_job(&mut self, job_id: Option<JobId>) {
        self.completed_job = job_id;
        self.dirty = true;
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) config: TrackerConfig,
    pub(crate) rng: StdRng,
    pub(crate) url: String,
    pub(crate) url_check: UrlCheck,
    pub(crate) format: FormatChoice,
    pub(crate) quality: Quality,
    pub(crate) ui: UiState,
    pub(crate) next_timer: TimerId,
    pub(crate) progress: ProgressController,
    pub(crate) preview: PreviewController,
    pub(crate) submission: SubmissionController,
}

/// Seeded with zero and cheap to build, so it can stand in while the driver
/// moves the live state through [`crate::update`]. Use [`AppState::new`] for
/// a state with fresh entropy.
impl Default for AppState {
    fn default() -> Self {
        Self::with_seed(TrackerConfig::default(), 0)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self::build(config, StdRng::from_entropy())
    }

    /// Deterministic job ids and preview jitter, for tests and replays.
    pub fn with_seed(config: TrackerConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: TrackerConfig, rng: StdRng) -> Self {
        let ui = UiState {
            dirty: true,
            ..UiState::default()
        };
        Self {
            config,
            rng,
            url: String::new(),
            url_check: check_url(""),
            format: FormatChoice::default(),
            quality: Quality::default(),
            ui,
            next_timer: 0,
            progress: ProgressController::new(),
            preview: PreviewController::new(),
            submission: SubmissionController::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The current or most recent job.
    pub fn job(&self) -> Option<&Job> {
        self.progress.job()
    }

    /// Every timer the state machine currently considers armed.
    pub fn armed_timers(&self) -> Vec<TimerId> {
        let mut timers = self.progress.armed_timers();
        timers.extend(self.submission.armed_timers());
        timers.extend(self.preview.armed_timers());
        timers
    }

    /// True once no job, preview or delayed transition is outstanding.
    pub fn is_settled(&self) -> bool {
        self.armed_timers().is_empty()
    }

    pub fn view(&self) -> AppViewModel {
        let threshold = self.config.poll_failure_threshold;
        AppViewModel {
            url: self.url.clone(),
            format: self.format,
            quality: self.quality,
            quality_options: quality_options(self.format),
            submit_enabled: self.ui.submit_enabled(),
            preview_enabled: self.ui.preview_enabled(),
            progress: self.ui.progress.clone(),
            error_text: self.ui.error_text.clone(),
            preview: self.ui.preview.clone(),
            completed_job: self.ui.completed_job.clone(),
            job: self.progress.job().map(|job| JobView {
                job_id: job.id().clone(),
                status: job.status(),
                displayed_progress: job.displayed_progress(),
                last_server_progress: job.last_server_progress(),
                consecutive_poll_failures: job.consecutive_poll_failures(),
                simulating: job.consecutive_poll_failures() > threshold,
            }),
            dirty: self.ui.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.ui.dirty)
    }
}
