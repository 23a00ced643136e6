//! Async driver: runs the pure core against real clients and timers.
//!
//! One task owns the [`AppState`] and consumes a single message channel.
//! Every effect the core returns is executed here: timers go to the
//! [`TimerRegistry`], requests become spawned tasks that answer through the
//! same channel, and submissions are tracked so callers can wait for the
//! attachment to land.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tracker_core::{update, AppState, AppViewModel, Effect, JobId, Msg};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::client::{MetadataClient, ReqwestClient, StatusClient, SubmissionChannel};
use crate::timer::{TimerRegistry, TimerSource, TokioTimerSource};
use crate::ClientError;

/// Receives a fresh view whenever something visible changed.
pub trait ViewSink: Send {
    fn render(&mut self, view: &AppViewModel);
}

/// Everything the driver talks to.
#[derive(Clone)]
pub struct Services {
    pub status: Arc<dyn StatusClient>,
    pub metadata: Arc<dyn MetadataClient>,
    pub submission: Arc<dyn SubmissionChannel>,
    pub timers: Arc<dyn TimerSource>,
}

impl Services {
    /// One HTTP client for every endpoint, real-time timers.
    pub fn from_client(client: ReqwestClient) -> Self {
        let client = Arc::new(client);
        Self {
            status: client.clone(),
            metadata: client.clone(),
            submission: client,
            timers: Arc::new(TokioTimerSource),
        }
    }
}

/// Outcome of one out-of-band submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub job_id: JobId,
    pub result: Result<PathBuf, ClientError>,
}

pub struct TrackerEngine {
    state: AppState,
    services: Services,
    timers: TimerRegistry,
    submissions: JoinSet<SubmissionOutcome>,
    tx: UnboundedSender<Msg>,
    rx: UnboundedReceiver<Msg>,
}

impl TrackerEngine {
    pub fn new(state: AppState, services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            services,
            timers: TimerRegistry::default(),
            submissions: JoinSet::new(),
            tx,
            rx,
        }
    }

    /// Handle for feeding user input from other tasks.
    pub fn sender(&self) -> UnboundedSender<Msg> {
        self.tx.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Number of timers the driver currently holds guards for.
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    /// Applies one message and executes the resulting effects. Must be called
    /// from within a tokio runtime.
    pub fn dispatch(&mut self, msg: Msg) {
        if let Msg::TimerFired(timer) = &msg {
            self.timers.fired(*timer);
        }
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.execute(effect);
        }
    }

    /// Waits for the next queued message and applies it. Returns false if the
    /// channel closed.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    /// Runs until no job, preview or delayed transition is outstanding,
    /// rendering after each visible change.
    pub async fn run_until_settled(&mut self, sink: &mut dyn ViewSink) {
        self.render_if_dirty(sink);
        while !self.state.is_settled() {
            if !self.step().await {
                break;
            }
            self.render_if_dirty(sink);
        }
    }

    fn render_if_dirty(&mut self, sink: &mut dyn ViewSink) {
        if self.state.consume_dirty() {
            sink.render(&self.state.view());
        }
    }

    /// Waits up to `grace` for in-flight submissions and returns their
    /// outcomes. Submissions still running afterwards are aborted.
    pub async fn wait_for_submissions(&mut self, grace: Duration) -> Vec<SubmissionOutcome> {
        let mut outcomes = Vec::new();
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            match tokio::time::timeout_at(deadline, self.submissions.join_next()).await {
                Ok(Some(Ok(outcome))) => outcomes.push(outcome),
                Ok(Some(Err(err))) => tracker_warn!("submission task failed: {}", err),
                Ok(None) => break,
                Err(_) => {
                    tracker_warn!(
                        "abandoning {} unfinished submission(s)",
                        self.submissions.len()
                    );
                    self.submissions.abort_all();
                    break;
                }
            }
        }
        outcomes
    }

    /// Releases every timer and drops any job or preview in flight.
    pub fn teardown(&mut self) {
        self.dispatch(Msg::Teardown);
        if !self.timers.is_empty() {
            tracker_debug!("dropping {} leftover timer guard(s)", self.timers.len());
        }
        self.timers.clear();
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::ArmTimer {
                timer,
                kind,
                schedule,
            } => {
                self.timers.arm(
                    self.services.timers.as_ref(),
                    timer,
                    kind,
                    schedule,
                    self.tx.clone(),
                );
            }
            Effect::CancelTimer { timer } => {
                self.timers.cancel(timer);
            }
            Effect::PollStatus { job_id } => {
                let client = self.services.status.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client
                        .check_progress(&job_id)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = tx.send(Msg::StatusPolled { job_id, result });
                });
            }
            Effect::FetchPreview { preview_id, query } => {
                let client = self.services.metadata.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.video_info(&query).await.map_err(|err| {
                        tracker_info!("preview {} failed: {}", preview_id, err);
                        err.preview_text()
                    });
                    let _ = tx.send(Msg::PreviewFetched { preview_id, result });
                });
            }
            Effect::SubmitDownload { job_id, form } => {
                let channel = self.services.submission.clone();
                self.submissions.spawn(async move {
                    let result = channel.submit(&job_id, &form).await;
                    if let Err(err) = &result {
                        tracker_warn!("submission for job {} failed: {}", job_id, err);
                    }
                    SubmissionOutcome { job_id, result }
                });
            }
        }
    }
}

impl Drop for TrackerEngine {
    fn drop(&mut self) {
        self.timers.clear();
        self.submissions.abort_all();
    }
}
