use std::io::{self, Write};

use tracker_core::AppViewModel;
use tracker_engine::ViewSink;

const BAR_WIDTH: usize = 30;

/// Lines describing what changed between two views.
pub fn render_changes(previous: Option<&AppViewModel>, view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if previous.map(|p| &p.progress) != Some(&view.progress) {
        if let Some(progress) = &view.progress {
            lines.push(format!(
                "{} {:>3}%  {}",
                progress_bar(progress.percent),
                progress.percent,
                progress.message
            ));
        }
    }

    if previous.map(|p| &p.error_text) != Some(&view.error_text) {
        if let Some(error) = &view.error_text {
            lines.push(format!("error: {error}"));
        }
    }

    if previous.map(|p| &p.preview) != Some(&view.preview) {
        if let Some(preview) = &view.preview {
            lines.push(format!("title:     {}", preview.title));
            lines.push(format!("video id:  {}", preview.video_id));
            lines.push(format!("thumbnail: {}", preview.thumbnail_url));
            lines.push(format!("format:    {}", preview.summary()));
        }
    }

    lines
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Prints view changes to stdout.
#[derive(Debug, Default)]
pub struct TerminalSink {
    last: Option<AppViewModel>,
}

impl ViewSink for TerminalSink {
    fn render(&mut self, view: &AppViewModel) {
        let lines = render_changes(self.last.as_ref(), view);
        if !lines.is_empty() {
            let mut out = io::stdout().lock();
            for line in &lines {
                let _ = writeln!(out, "{line}");
            }
            let _ = out.flush();
        }
        self.last = Some(view.clone());
    }
}
