use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracker_core::{FormatChoice, Quality};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "tracker",
    about = "Submit media conversions and follow their progress"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, value_name = "URL", global = true, help = "Server base URL")]
    pub base_url: Option<String>,

    #[arg(
        long,
        value_name = "TOKEN",
        global = true,
        help = "Anti-forgery token sent with every request"
    )]
    pub csrf_token: Option<String>,

    #[arg(long, value_name = "FILE", global = true, help = "RON config file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogDestination::File, global = true)]
    pub log: LogDestination,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch title and thumbnail for a link.
    Preview(FormArgs),
    /// Submit a conversion and follow it to completion.
    Download(DownloadArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Mp3,
    Mp4,
}

impl From<FormatArg> for FormatChoice {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Mp3 => FormatChoice::Audio,
            FormatArg::Mp4 => FormatChoice::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Highest,
    Medium,
    Lowest,
}

impl From<QualityArg> for Quality {
    fn from(value: QualityArg) -> Self {
        match value {
            QualityArg::Highest => Quality::Highest,
            QualityArg::Medium => Quality::Medium,
            QualityArg::Lowest => Quality::Lowest,
        }
    }
}

#[derive(Debug, Args)]
pub struct FormArgs {
    #[arg(help = "YouTube link")]
    pub url: String,
    #[arg(short, long, value_enum, default_value_t = FormatArg::Mp4)]
    pub format: FormatArg,
    #[arg(short, long, value_enum, default_value_t = QualityArg::Highest)]
    pub quality: QualityArg,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub form: FormArgs,
    #[arg(short, long, value_name = "DIR", help = "Directory for the converted file")]
    pub output: Option<PathBuf>,
}

impl Command {
    pub fn form(&self) -> &FormArgs {
        match self {
            Command::Preview(form) => form,
            Command::Download(download) => &download.form,
        }
    }
}
