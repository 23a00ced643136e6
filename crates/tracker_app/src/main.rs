mod cli;
mod config;
mod logging;
mod render;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracker_core::{AppState, JobStatus, Msg};
use tracker_engine::{ReqwestClient, Services, TrackerEngine};
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::render::TerminalSink;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracker_error!("{error:#}");
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, logging::level_for(cli.verbose));

    let mut config = AppConfig::load_optional(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    if let Some(token) = &cli.csrf_token {
        config.csrf_token = Some(token.clone());
    }
    if let Command::Download(download) = &cli.command {
        if let Some(output) = &download.output {
            config.output_dir = Some(output.clone());
        }
    }

    let settings = config.client_settings();
    let client = ReqwestClient::new(settings.clone())
        .with_context(|| format!("Invalid server base URL: {}", settings.base_url))?;
    let state = AppState::with_config(config.tracker.clone());
    let mut engine = TrackerEngine::new(state, Services::from_client(client));

    let form = cli.command.form();
    engine.dispatch(Msg::InputChanged(form.url.clone()));
    engine.dispatch(Msg::FormatChanged(form.format.into()));
    engine.dispatch(Msg::QualityChanged(form.quality.into()));
    let view = engine.view();
    if !view.preview_enabled {
        bail!(
            "{}",
            view.error_text
                .unwrap_or_else(|| "Please enter a YouTube link.".to_string())
        );
    }

    match &cli.command {
        Command::Preview(_) => {
            engine.dispatch(Msg::PreviewClicked);
            follow(&mut engine).await?;
            let view = engine.view();
            match (view.preview, view.error_text) {
                (Some(_), _) => Ok(()),
                (None, Some(error)) => bail!("{error}"),
                (None, None) => bail!("Preview finished without a result"),
            }
        }
        Command::Download(_) => {
            engine.dispatch(Msg::SubmitClicked);
            follow(&mut engine).await?;
            finish_download(&mut engine, &config).await
        }
    }
}

/// Renders until the state machine settles or the user interrupts.
async fn follow(engine: &mut TrackerEngine) -> Result<()> {
    let mut sink = TerminalSink::default();
    let interrupted = tokio::select! {
        _ = engine.run_until_settled(&mut sink) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        tracker_info!("interrupted, releasing timers");
        engine.teardown();
        bail!("Interrupted");
    }
    Ok(())
}

async fn finish_download(engine: &mut TrackerEngine, config: &AppConfig) -> Result<()> {
    let view = engine.view();
    let Some(job) = view.job else {
        bail!("No download was started");
    };

    match job.status {
        JobStatus::Complete => {}
        JobStatus::Error => bail!(
            "{}",
            view.error_text
                .unwrap_or_else(|| "The download failed on the server.".to_string())
        ),
        JobStatus::TimedOut => {
            tracker_warn!("job {} timed out waiting for progress", job.job_id);
            println!("Stopped waiting for progress; still waiting for the file...");
        }
        JobStatus::Pending | JobStatus::Polling => bail!("Download did not finish"),
    }

    let grace = match job.status {
        JobStatus::TimedOut => config.client_settings().submit_timeout,
        _ => config.submission_grace(),
    };
    let outcomes = engine.wait_for_submissions(grace).await;
    let Some(outcome) = outcomes.into_iter().find(|outcome| outcome.job_id == job.job_id) else {
        bail!("The converted file did not arrive in time");
    };
    let path = outcome
        .result
        .with_context(|| format!("Could not save the file for job {}", job.job_id))?;
    println!("Saved {}", path.display());
    Ok(())
}
