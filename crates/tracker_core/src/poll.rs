//! Progress controller: owns one job's poll loop from start to terminal status.
//!
//! The controller holds the per-job [`Job`] record and two timer slots: the
//! repeating poll tick and the one-shot delay that keeps a final percentage on
//! screen before an error or overflow finish. Both slots are released on every
//! path into a terminal status and on teardown.

use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::progress::{MergeOutcome, ProgressUpdate, SimulationPhase, COMPLETE};
use crate::timer::{Context, Schedule, TimerKind, TimerSlot};
use crate::{Effect, Job, JobId, JobStatus, ReportedStatus, StatusReport, TimerId};

const COMPLETE_MESSAGE: &str = "Download complete!";
const ERROR_FALLBACK_MESSAGE: &str = "The download failed on the server.";
const TIMED_OUT_MESSAGE: &str =
    "Stopped waiting for the server; the download may still finish in the background.";

/// Terminal transition produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFinished {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingFinish {
    status: JobStatus,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressController {
    job: Option<Job>,
    poll_timer: TimerSlot,
    finish_timer: TimerSlot,
    pending_finish: Option<PendingFinish>,
}

impl Default for ProgressController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressController {
    pub fn new() -> Self {
        Self {
            job: None,
            poll_timer: TimerSlot::new(TimerKind::PollTick),
            finish_timer: TimerSlot::new(TimerKind::FinishDelay),
            pending_finish: None,
        }
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub(crate) fn owns_timer(&self, timer: TimerId) -> bool {
        self.poll_timer.owns(timer) || self.finish_timer.owns(timer)
    }

    pub(crate) fn armed_timers(&self) -> Vec<TimerId> {
        [self.poll_timer.armed(), self.finish_timer.armed()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Enters Polling for `job_id`, superseding any previous run.
    pub(crate) fn start(&mut self, job_id: JobId, cx: &mut Context<'_>) {
        self.poll_timer.release(cx);
        self.finish_timer.release(cx);
        self.pending_finish = None;
        if let Some(previous) = self.job.as_ref().filter(|job| !job.status().is_terminal()) {
            tracker_warn!("job {} superseded by job {}", previous.id(), job_id);
        }

        let mut job = Job::new(job_id);
        job.advance(JobStatus::Polling);
        job.progress_mut().raise_floor(cx.config.initial_progress);
        job.set_message(SimulationPhase::Preparing.message());
        cx.ui.show_progress(job.displayed_progress(), job.message());
        tracker_info!("polling started for job {}", job.id());

        self.poll_timer
            .arm(Schedule::Repeating(cx.config.poll_interval()), cx);
        self.job = Some(job);
    }

    pub(crate) fn on_timer(&mut self, timer: TimerId, cx: &mut Context<'_>) -> Option<JobFinished> {
        if self.poll_timer.owns(timer) {
            self.on_tick(cx);
            None
        } else if self.finish_timer.take_fired(timer) {
            let pending = self.pending_finish.as_ref()?.status;
            let job_id = self.job.as_ref()?.id().clone();
            self.stop(&job_id, pending, cx)
        } else {
            None
        }
    }

    fn on_tick(&mut self, cx: &mut Context<'_>) {
        if self.pending_finish.is_some() {
            return;
        }
        let Some(job) = self.job.as_mut() else {
            return;
        };
        if job.status() != JobStatus::Polling {
            return;
        }

        let tick = job.record_tick();
        tracker_logging::set_tick(tick);
        if job.poll_sent() {
            note_failure(job, cx.config.poll_failure_threshold, "no answer before next tick");
        }
        cx.effects.push(Effect::PollStatus {
            job_id: job.id().clone(),
        });

        if job.consecutive_poll_failures() > cx.config.poll_failure_threshold {
            let next = job
                .progress()
                .simulated_next(cx.config.simulation_ceiling());
            if job.progress_mut().apply(next) == MergeOutcome::Advanced {
                let phase = SimulationPhase::for_progress(job.displayed_progress());
                job.set_message(phase.message());
                tracker_debug!("job {} simulated {}%", job.id(), job.displayed_progress());
            }
            cx.ui.show_progress(job.displayed_progress(), job.message());
        }
    }

    /// Applies one status poll outcome.
    pub(crate) fn on_poll_result(
        &mut self,
        job_id: &JobId,
        result: Result<StatusReport, String>,
        cx: &mut Context<'_>,
    ) -> Option<JobFinished> {
        if self.pending_finish.is_some() {
            return None;
        }
        let threshold = cx.config.poll_failure_threshold;
        let job = self.job.as_mut()?;
        if job.id() != job_id {
            tracker_debug!("dropping status for inactive job {}", job_id);
            return None;
        }
        if job.status() != JobStatus::Polling {
            return None;
        }

        let outstanding = job.poll_answered();
        let report = match result {
            Ok(report) => report,
            Err(reason) => {
                // A late failure was already counted by the tick that found it silent.
                if outstanding {
                    note_failure(job, threshold, &reason);
                }
                return None;
            }
        };

        match report.progress {
            Some(value) => {
                job.reset_failures();
                job.progress_mut().apply(ProgressUpdate::Real(value));
            }
            None if outstanding => note_failure(job, threshold, "missing progress field"),
            None => {}
        }
        match report.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => job.set_message(message),
            _ => match report.status {
                ReportedStatus::Pending => job.set_message("Waiting for the server..."),
                ReportedStatus::Downloading => job.set_message("Downloading..."),
                _ => {}
            },
        }
        cx.ui.show_progress(job.displayed_progress(), job.message());

        let reached_end = report.progress.is_some_and(|value| value >= COMPLETE);
        match report.status {
            ReportedStatus::Complete => {
                let job_id = job.id().clone();
                self.stop(&job_id, JobStatus::Complete, cx)
            }
            ReportedStatus::Error => {
                self.schedule_finish(JobStatus::Error, report.message, cx);
                None
            }
            _ if reached_end => {
                self.schedule_finish(JobStatus::Complete, None, cx);
                None
            }
            _ => None,
        }
    }

    fn schedule_finish(
        &mut self,
        status: JobStatus,
        message: Option<String>,
        cx: &mut Context<'_>,
    ) {
        self.poll_timer.release(cx);
        self.pending_finish = Some(PendingFinish { status, message });
        self.finish_timer
            .arm(Schedule::Once(cx.config.final_display_delay()), cx);
    }

    /// Moves the job into a terminal status. Calls after the first one, or
    /// for a job this controller no longer tracks, change nothing.
    pub(crate) fn stop(
        &mut self,
        job_id: &JobId,
        status: JobStatus,
        cx: &mut Context<'_>,
    ) -> Option<JobFinished> {
        if !status.is_terminal() {
            return None;
        }
        let job = self.job.as_mut()?;
        if job.id() != job_id || !job.advance(status) {
            return None;
        }

        self.poll_timer.release(cx);
        self.finish_timer.release(cx);
        let pending = self.pending_finish.take();

        match status {
            JobStatus::Complete => {
                job.progress_mut().apply(ProgressUpdate::Real(COMPLETE));
                job.set_message(COMPLETE_MESSAGE);
                cx.ui.set_error(None);
                cx.ui.show_progress(job.displayed_progress(), job.message());
                cx.ui.set_completed_job(Some(job.id().clone()));
            }
            JobStatus::Error => {
                let text = pending
                    .and_then(|pending| pending.message)
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| ERROR_FALLBACK_MESSAGE.to_string());
                job.set_message(text.clone());
                cx.ui.hide_progress();
                cx.ui.set_error(Some(text));
            }
            JobStatus::TimedOut => {
                job.set_message(TIMED_OUT_MESSAGE);
                cx.ui.hide_progress();
            }
            JobStatus::Pending | JobStatus::Polling => {}
        }
        cx.ui.unlock_affordances();
        tracker_info!(
            "job {} finished as {:?} at {}%",
            job.id(),
            status,
            job.displayed_progress()
        );

        Some(JobFinished {
            job_id: job.id().clone(),
            status,
        })
    }

    /// Releases every timer and discards the job.
    pub(crate) fn teardown(&mut self, cx: &mut Context<'_>) {
        self.poll_timer.release(cx);
        self.finish_timer.release(cx);
        self.pending_finish = None;
        if let Some(job) = self.job.take() {
            if !job.status().is_terminal() {
                tracker_info!("teardown discarded job {} while {:?}", job.id(), job.status());
            }
        }
    }
}

fn note_failure(job: &mut Job, threshold: u32, reason: &str) {
    let failures = job.record_failure();
    if failures == threshold.saturating_add(1) {
        tracker_warn!(
            "job {}: {} consecutive poll failures ({}), simulating progress",
            job.id(),
            failures,
            reason
        );
    } else {
        tracker_debug!("job {}: poll failure {} ({})", job.id(), failures, reason);
    }
}
