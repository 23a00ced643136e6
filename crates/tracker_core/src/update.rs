use tracker_logging::tracker_debug;

use crate::form::{check_url, PreviewQuery, Quality, UrlCheck, INVALID_URL_MESSAGE};
use crate::timer::Context;
use crate::{AppState, Effect, JobId, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = state.handle(msg);
    (state, effects)
}

impl AppState {
    fn handle(&mut self, msg: Msg) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut cx = Context {
            config: &self.config,
            ui: &mut self.ui,
            effects: &mut effects,
            next_timer: &mut self.next_timer,
        };

        match msg {
            Msg::InputChanged(raw) => {
                self.url_check = check_url(&raw);
                self.url = raw.trim().to_string();
                cx.ui.set_url_valid(matches!(self.url_check, UrlCheck::Valid { .. }));
                cx.ui
                    .set_error(self.url_check.error_message().map(ToOwned::to_owned));
            }
            Msg::FormatChanged(format) => {
                self.format = format;
                self.quality = Quality::default();
                cx.ui.mark_dirty();
            }
            Msg::QualityChanged(quality) => {
                self.quality = quality;
                cx.ui.mark_dirty();
            }
            Msg::PreviewClicked => {
                if !cx.ui.preview_enabled() {
                    tracker_debug!("preview ignored while busy or without a valid url");
                    return effects;
                }
                let Some(video_id) = self.url_check.video_id().map(ToOwned::to_owned) else {
                    return effects;
                };
                let query = PreviewQuery {
                    url: self.url.clone(),
                    format: self.format,
                    quality: self.quality,
                };
                self.preview.start(query, video_id, &mut cx);
            }
            Msg::SubmitClicked => {
                if !cx.ui.submit_enabled() {
                    tracker_debug!("submit ignored while a job or preview is in flight");
                    return effects;
                }
                if !matches!(self.url_check, UrlCheck::Valid { .. }) {
                    let text = self
                        .url_check
                        .error_message()
                        .unwrap_or(INVALID_URL_MESSAGE);
                    cx.ui.set_error(Some(text.to_string()));
                    return effects;
                }
                let job_id = JobId::mint(&mut self.rng);
                let form = PreviewQuery {
                    url: self.url.clone(),
                    format: self.format,
                    quality: self.quality,
                };
                self.submission
                    .submit(job_id, form, &mut self.progress, &mut cx);
            }
            Msg::TimerFired(timer) => {
                if self.progress.owns_timer(timer) {
                    if let Some(finished) = self.progress.on_timer(timer, &mut cx) {
                        self.submission.job_finished(&finished, &mut cx);
                    }
                } else if self.submission.owns_timer(timer) {
                    self.submission
                        .on_timer(timer, &mut self.progress, &mut cx);
                } else if self.preview.owns_timer(timer) {
                    self.preview.on_timer(timer, &mut self.rng, &mut cx);
                } else {
                    tracker_debug!("ignoring stale timer {}", timer);
                }
            }
            Msg::StatusPolled { job_id, result } => {
                if let Some(finished) = self.progress.on_poll_result(&job_id, result, &mut cx) {
                    self.submission.job_finished(&finished, &mut cx);
                }
            }
            Msg::PreviewFetched { preview_id, result } => {
                self.preview.on_fetched(preview_id, result, &mut cx);
            }
            Msg::Teardown => {
                self.progress.teardown(&mut cx);
                self.submission.teardown(&mut cx);
                self.preview.teardown(&mut cx);
            }
        }

        effects
    }
}
