//! Preview controller: progress illusion around a single metadata request.
use rand::Rng;
use tracker_logging::{tracker_debug, tracker_info};

use crate::form::thumbnail_url;
use crate::progress::{MergeOutcome, ProgressTrack, ProgressUpdate, COMPLETE};
use crate::timer::{Context, Schedule, TimerKind, TimerSlot};
use crate::view_model::PreviewResult;
use crate::{Effect, PreviewQuery, TimerId, VideoInfo};

pub type PreviewId = u64;

const FETCHING_MESSAGE: &str = "Fetching video info...";
const LOADED_MESSAGE: &str = "Video info loaded!";
const FAILED_MESSAGE: &str = "Could not load video info.";

#[derive(Debug, Clone)]
struct PreviewRun {
    id: PreviewId,
    query: PreviewQuery,
    fallback_video_id: String,
    track: ProgressTrack,
    outcome: Option<Result<PreviewResult, String>>,
}

#[derive(Debug, Clone)]
pub struct PreviewController {
    run: Option<PreviewRun>,
    last_id: PreviewId,
    tick_timer: TimerSlot,
    reveal_timer: TimerSlot,
}

impl Default for PreviewController {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewController {
    pub fn new() -> Self {
        Self {
            run: None,
            last_id: 0,
            tick_timer: TimerSlot::new(TimerKind::PreviewTick),
            reveal_timer: TimerSlot::new(TimerKind::PreviewReveal),
        }
    }

    pub(crate) fn owns_timer(&self, timer: TimerId) -> bool {
        self.tick_timer.owns(timer) || self.reveal_timer.owns(timer)
    }

    pub(crate) fn armed_timers(&self) -> Vec<TimerId> {
        [self.tick_timer.armed(), self.reveal_timer.armed()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Starts a new run. An in-flight run is superseded and its late response
    /// will be ignored.
    pub(crate) fn start(
        &mut self,
        query: PreviewQuery,
        fallback_video_id: String,
        cx: &mut Context<'_>,
    ) -> PreviewId {
        self.tick_timer.release(cx);
        self.reveal_timer.release(cx);
        if let Some(previous) = self.run.take() {
            tracker_info!("preview {} superseded", previous.id);
        }

        self.last_id += 1;
        let id = self.last_id;
        cx.ui.set_preview(None);
        cx.ui.set_error(None);
        cx.ui.set_preview_in_flight(true);
        cx.ui.show_progress(0, FETCHING_MESSAGE);
        cx.effects.push(Effect::FetchPreview {
            preview_id: id,
            query: query.clone(),
        });
        self.tick_timer
            .arm(Schedule::Repeating(cx.config.preview_tick()), cx);

        self.run = Some(PreviewRun {
            id,
            query,
            fallback_video_id,
            track: ProgressTrack::default(),
            outcome: None,
        });
        id
    }

    pub(crate) fn on_timer<R: Rng>(
        &mut self,
        timer: TimerId,
        rng: &mut R,
        cx: &mut Context<'_>,
    ) {
        if self.tick_timer.owns(timer) {
            self.on_tick(rng, cx);
        } else if self.reveal_timer.take_fired(timer) {
            self.reveal(cx);
        }
    }

    fn on_tick<R: Rng>(&mut self, rng: &mut R, cx: &mut Context<'_>) {
        let Some(run) = self.run.as_mut().filter(|run| run.outcome.is_none()) else {
            return;
        };
        let (low, high) = cx.config.preview_step_range();
        let step = rng.gen_range(low..=high);
        let next = run
            .track
            .displayed()
            .saturating_add(step)
            .min(cx.config.preview_cap.min(COMPLETE - 1));
        if run.track.apply(ProgressUpdate::Simulated(next)) == MergeOutcome::Advanced {
            cx.ui.show_progress(run.track.displayed(), FETCHING_MESSAGE);
        }
    }

    /// Snaps the run to completion and schedules the reveal.
    pub(crate) fn on_fetched(
        &mut self,
        preview_id: PreviewId,
        result: Result<VideoInfo, String>,
        cx: &mut Context<'_>,
    ) {
        let Some(run) = self
            .run
            .as_mut()
            .filter(|run| run.id == preview_id && run.outcome.is_none())
        else {
            tracker_debug!("dropping stale preview response {}", preview_id);
            return;
        };

        self.tick_timer.release(cx);
        run.track.apply(ProgressUpdate::Real(COMPLETE));

        let delay = match result {
            Ok(info) => {
                let video_id = info
                    .video_id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| run.fallback_video_id.clone());
                run.outcome = Some(Ok(PreviewResult {
                    thumbnail_url: thumbnail_url(&video_id),
                    video_id,
                    title: info.title,
                    format_label: run.query.format.label(),
                    quality_label: run.query.quality.label(),
                }));
                cx.ui.show_progress(run.track.displayed(), LOADED_MESSAGE);
                cx.config.preview_success_delay()
            }
            Err(message) => {
                tracker_info!("preview {} failed: {}", run.id, message);
                run.outcome = Some(Err(message));
                cx.ui.show_progress(run.track.displayed(), FAILED_MESSAGE);
                cx.config.preview_error_delay()
            }
        };
        self.reveal_timer.arm(Schedule::Once(delay), cx);
    }

    fn reveal(&mut self, cx: &mut Context<'_>) {
        let Some(run) = self.run.take() else {
            return;
        };
        cx.ui.hide_progress();
        cx.ui.set_preview_in_flight(false);
        match run.outcome {
            Some(Ok(preview)) => cx.ui.set_preview(Some(preview)),
            Some(Err(message)) => cx.ui.set_error(Some(message)),
            None => {}
        }
    }

    pub(crate) fn teardown(&mut self, cx: &mut Context<'_>) {
        self.tick_timer.release(cx);
        self.reveal_timer.release(cx);
        self.run = None;
    }
}
