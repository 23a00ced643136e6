use tracker_logging::{tracker_info, tracker_warn};

use crate::poll::{JobFinished, ProgressController};
use crate::timer::{Context, Schedule, TimerKind, TimerSlot};
use crate::{DownloadForm, Effect, JobId, JobStatus, TimerId};

const STARTING_MESSAGE: &str = "Starting download...";

/// Starts jobs and owns the safety timeout that bounds each of them.
#[derive(Debug, Clone)]
pub struct SubmissionController {
    job_id: Option<JobId>,
    safety_timer: TimerSlot,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            job_id: None,
            safety_timer: TimerSlot::new(TimerKind::SafetyTimeout),
        }
    }

    pub(crate) fn owns_timer(&self, timer: TimerId) -> bool {
        self.safety_timer.owns(timer)
    }

    pub(crate) fn armed_timers(&self) -> Vec<TimerId> {
        self.safety_timer.armed().into_iter().collect()
    }

    /// Submits a validated form under a freshly minted id.
    pub(crate) fn submit(
        &mut self,
        job_id: JobId,
        form: DownloadForm,
        progress: &mut ProgressController,
        cx: &mut Context<'_>,
    ) {
        tracker_info!(
            "submitting job {} format={} quality={}",
            job_id,
            form.format.wire_value(),
            form.quality.wire_value()
        );
        cx.ui.lock_affordances();
        cx.ui.set_error(None);
        cx.ui.set_completed_job(None);
        cx.ui.show_progress(cx.config.initial_progress, STARTING_MESSAGE);
        cx.effects.push(Effect::SubmitDownload {
            job_id: job_id.clone(),
            form,
        });

        progress.start(job_id.clone(), cx);
        self.safety_timer
            .arm(Schedule::Once(cx.config.safety_timeout()), cx);
        self.job_id = Some(job_id);
    }

    /// Handles the safety timeout. Fires at most once per armed timer.
    pub(crate) fn on_timer(
        &mut self,
        timer: TimerId,
        progress: &mut ProgressController,
        cx: &mut Context<'_>,
    ) -> Option<JobFinished> {
        if !self.safety_timer.take_fired(timer) {
            return None;
        }
        let job_id = self.job_id.take()?;
        tracker_warn!(
            "safety timeout fired for job {}; resetting the form without a final status",
            job_id
        );
        cx.ui.hide_progress();
        cx.ui.unlock_affordances();
        progress.stop(&job_id, JobStatus::TimedOut, cx)
    }

    /// Releases the safety timeout once the job has ended some other way.
    pub(crate) fn job_finished(&mut self, finished: &JobFinished, cx: &mut Context<'_>) {
        if self.job_id.as_ref() == Some(&finished.job_id) {
            self.safety_timer.release(cx);
            self.job_id = None;
        }
    }

    pub(crate) fn teardown(&mut self, cx: &mut Context<'_>) {
        self.safety_timer.release(cx);
        self.job_id = None;
    }
}
