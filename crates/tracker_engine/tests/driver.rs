use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracker_core::{
    AppState, AppViewModel, DownloadForm, JobId, JobStatus, Msg, PreviewQuery, ReportedStatus,
    Schedule, StatusReport, TimerId, TrackerConfig, VideoInfo,
};
use tracker_engine::{
    ClientError, ManualTimerSource, MetadataClient, Services, StatusClient, SubmissionChannel,
    TrackerEngine, ViewSink,
};

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Answers polls from a script, then fails forever.
#[derive(Default)]
struct ScriptedStatus {
    replies: Mutex<VecDeque<Option<StatusReport>>>,
}

impl ScriptedStatus {
    fn new(replies: Vec<Option<StatusReport>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

fn failure() -> ClientError {
    tracker_engine::parse_status_report(b"not json").unwrap_err()
}

#[async_trait::async_trait]
impl StatusClient for ScriptedStatus {
    async fn check_progress(&self, _job_id: &JobId) -> Result<StatusReport, ClientError> {
        let next = self.replies.lock().unwrap().pop_front().flatten();
        next.ok_or_else(failure)
    }
}

struct FixedMetadata(Result<VideoInfo, String>);

#[async_trait::async_trait]
impl MetadataClient for FixedMetadata {
    async fn video_info(&self, _query: &PreviewQuery) -> Result<VideoInfo, ClientError> {
        match &self.0 {
            Ok(info) => Ok(info.clone()),
            Err(_) => Err(failure()),
        }
    }
}

#[derive(Default)]
struct RecordingChannel {
    submitted: Mutex<Vec<(JobId, DownloadForm)>>,
}

#[async_trait::async_trait]
impl SubmissionChannel for RecordingChannel {
    async fn submit(&self, job_id: &JobId, form: &DownloadForm) -> Result<PathBuf, ClientError> {
        self.submitted
            .lock()
            .unwrap()
            .push((job_id.clone(), form.clone()));
        Ok(PathBuf::from(format!("{job_id}.mp4")))
    }
}

#[derive(Default)]
struct CollectingSink {
    views: Vec<AppViewModel>,
}

impl ViewSink for CollectingSink {
    fn render(&mut self, view: &AppViewModel) {
        self.views.push(view.clone());
    }
}

struct Rig {
    engine: TrackerEngine,
    timers: ManualTimerSource,
    channel: Arc<RecordingChannel>,
}

fn rig(status: ScriptedStatus, metadata: FixedMetadata) -> Rig {
    let timers = ManualTimerSource::new();
    let channel = Arc::new(RecordingChannel::default());
    let services = Services {
        status: Arc::new(status),
        metadata: Arc::new(metadata),
        submission: channel.clone(),
        timers: Arc::new(timers.clone()),
    };
    let state = AppState::with_seed(TrackerConfig::default(), 21);
    Rig {
        engine: TrackerEngine::new(state, services),
        timers,
        channel,
    }
}

fn downloading(progress: u8) -> Option<StatusReport> {
    Some(StatusReport {
        progress: Some(progress),
        status: ReportedStatus::Downloading,
        message: None,
    })
}

fn complete() -> Option<StatusReport> {
    Some(StatusReport {
        progress: Some(100),
        status: ReportedStatus::Complete,
        message: None,
    })
}

fn timer_with(timers: &ManualTimerSource, schedule: Schedule) -> TimerId {
    timers
        .armed()
        .into_iter()
        .find(|(_, armed)| *armed == schedule)
        .map(|(timer, _)| timer)
        .expect("timer armed")
}

impl Rig {
    /// Fires the poll timer and processes the tick plus its answer.
    async fn poll_once(&mut self) {
        let poll = timer_with(&self.timers, Schedule::Repeating(Duration::from_secs(1)));
        assert!(self.timers.fire(poll));
        assert!(self.engine.step().await);
        assert!(self.engine.step().await);
    }
}

#[tokio::test]
async fn download_runs_to_completion_and_releases_timers() {
    let mut rig = rig(
        ScriptedStatus::new(vec![downloading(20), downloading(55), complete()]),
        FixedMetadata(Err("unused".into())),
    );
    rig.engine.dispatch(Msg::InputChanged(URL.into()));
    rig.engine.dispatch(Msg::SubmitClicked);
    assert_eq!(rig.timers.armed().len(), 2);
    assert_eq!(rig.engine.live_timers(), 2);

    let mut seen = vec![rig.engine.view().progress.unwrap().percent];
    for _ in 0..3 {
        rig.poll_once().await;
        seen.push(rig.engine.view().progress.unwrap().percent);
    }
    assert_eq!(seen, vec![5, 20, 55, 100]);

    let view = rig.engine.view();
    assert_eq!(view.job.unwrap().status, JobStatus::Complete);
    assert!(view.submit_enabled);
    assert!(rig.timers.armed().is_empty());
    assert_eq!(rig.engine.live_timers(), 0);

    let outcomes = rig.engine.wait_for_submissions(Duration::from_secs(1)).await;
    assert_eq!(outcomes.len(), 1);
    let submitted = rig.channel.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].0, outcomes[0].job_id);
    assert_eq!(submitted[0].1.url, URL);
}

#[tokio::test]
async fn unreachable_server_simulates_then_times_out() {
    let mut rig = rig(ScriptedStatus::default(), FixedMetadata(Err("unused".into())));
    rig.engine.dispatch(Msg::InputChanged(URL.into()));
    rig.engine.dispatch(Msg::SubmitClicked);

    let mut previous = 5;
    for tick in 1..=20 {
        rig.poll_once().await;
        let shown = rig.engine.view().job.unwrap().displayed_progress;
        if tick >= 7 {
            assert!(shown > previous);
        }
        assert!(shown <= 94);
        previous = shown;
    }

    let safety = timer_with(&rig.timers, Schedule::Once(Duration::from_secs(60)));
    assert!(rig.timers.fire(safety));
    assert!(rig.engine.step().await);

    let view = rig.engine.view();
    assert_eq!(view.job.unwrap().status, JobStatus::TimedOut);
    assert!(view.submit_enabled);
    assert!(view.progress.is_none());
    assert_eq!(rig.engine.live_timers(), 0);
    assert!(rig.timers.armed().is_empty());
}

#[tokio::test]
async fn preview_failure_renders_error_after_reveal() {
    let mut rig = rig(ScriptedStatus::default(), FixedMetadata(Err("boom".into())));
    rig.engine.dispatch(Msg::InputChanged(URL.into()));
    rig.engine.dispatch(Msg::PreviewClicked);

    let tick = timer_with(&rig.timers, Schedule::Repeating(Duration::from_millis(250)));
    assert!(rig.timers.fire(tick));

    // The tick and the metadata answer arrive in either order.
    assert!(rig.engine.step().await);
    assert!(rig.engine.step().await);
    assert_eq!(rig.engine.view().progress.unwrap().percent, 100);

    let reveal = timer_with(&rig.timers, Schedule::Once(Duration::from_millis(400)));
    assert!(rig.timers.fire(reveal));
    assert!(rig.engine.step().await);

    let view = rig.engine.view();
    assert!(view.progress.is_none());
    assert_eq!(
        view.error_text.as_deref(),
        Some("Could not load video info (malformed response).")
    );
    assert!(view.preview.is_none());
    assert!(rig.engine.state().is_settled());
    assert_eq!(rig.engine.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn real_timers_drive_a_preview_to_settlement() {
    let info = VideoInfo {
        video_id: Some("dQw4w9WgXcQ".into()),
        title: "Never Gonna Give You Up".into(),
    };
    let services = Services {
        status: Arc::new(ScriptedStatus::default()),
        metadata: Arc::new(FixedMetadata(Ok(info))),
        submission: Arc::new(RecordingChannel::default()),
        timers: Arc::new(tracker_engine::TokioTimerSource),
    };
    let mut engine = TrackerEngine::new(AppState::with_seed(TrackerConfig::default(), 2), services);
    engine.dispatch(Msg::InputChanged(URL.into()));
    engine.dispatch(Msg::PreviewClicked);

    let mut sink = CollectingSink::default();
    engine.run_until_settled(&mut sink).await;

    let last = sink.views.last().expect("rendered");
    let preview = last.preview.as_ref().expect("preview shown");
    assert_eq!(preview.title, "Never Gonna Give You Up");
    assert!(last.progress.is_none());
    assert!(sink
        .views
        .iter()
        .any(|view| view.progress.as_ref().is_some_and(|p| p.percent == 100)));
    assert_eq!(engine.live_timers(), 0);
}

#[tokio::test]
async fn teardown_mid_job_cancels_all_timers() {
    let mut rig = rig(
        ScriptedStatus::new(vec![downloading(30)]),
        FixedMetadata(Err("unused".into())),
    );
    rig.engine.dispatch(Msg::InputChanged(URL.into()));
    rig.engine.dispatch(Msg::SubmitClicked);
    rig.poll_once().await;

    rig.engine.teardown();
    assert!(rig.timers.armed().is_empty());
    assert_eq!(rig.engine.live_timers(), 0);
    assert!(rig.engine.state().is_settled());
    rig.engine.teardown();
}
