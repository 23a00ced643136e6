//! Form inputs, URL validation and the display labels derived from them.
use url::Url;

const VIDEO_ID_LEN: usize = 11;
pub const INVALID_URL_MESSAGE: &str = "Invalid URL. Please enter a valid YouTube URL.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatChoice {
    Audio,
    #[default]
    Video,
}

impl FormatChoice {
    /// Value sent as `format_choice`.
    pub fn wire_value(self) -> &'static str {
        match self {
            FormatChoice::Audio => "mp3",
            FormatChoice::Video => "mp4",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp3" | "audio" => Some(FormatChoice::Audio),
            "mp4" | "video" => Some(FormatChoice::Video),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatChoice::Audio => "Audio MP3",
            FormatChoice::Video => "Video MP4",
        }
    }

    pub fn extension(self) -> &'static str {
        self.wire_value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Highest,
    Medium,
    Lowest,
}

impl Quality {
    pub fn wire_value(self) -> &'static str {
        match self {
            Quality::Highest => "highest",
            Quality::Medium => "medium",
            Quality::Lowest => "lowest",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "highest" => Some(Quality::Highest),
            "medium" => Some(Quality::Medium),
            "lowest" => Some(Quality::Lowest),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Highest => "high quality",
            Quality::Medium => "medium quality",
            Quality::Lowest => "low quality",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOption {
    pub quality: Quality,
    pub label: &'static str,
}

/// Selectable qualities for a format, in display order.
pub fn quality_options(format: FormatChoice) -> Vec<QualityOption> {
    let labels = match format {
        FormatChoice::Audio => ["Highest", "Medium", "Lowest"],
        FormatChoice::Video => ["HD/Highest", "Medium (720p)", "Low (480p)"],
    };
    [Quality::Highest, Quality::Medium, Quality::Lowest]
        .into_iter()
        .zip(labels)
        .map(|(quality, label)| QualityOption { quality, label })
        .collect()
}

/// Fields posted by the metadata request and the out-of-band submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewQuery {
    pub url: String,
    pub format: FormatChoice,
    pub quality: Quality,
}

pub type DownloadForm = PreviewQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    Empty,
    Invalid,
    Valid { video_id: String },
}

impl UrlCheck {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            UrlCheck::Valid { video_id } => Some(video_id),
            UrlCheck::Empty | UrlCheck::Invalid => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            UrlCheck::Invalid => Some(INVALID_URL_MESSAGE),
            UrlCheck::Empty | UrlCheck::Valid { .. } => None,
        }
    }
}

/// Accepts `youtube.com/watch?v=<id>` and `youtu.be/<id>` links, with or
/// without scheme and `www.`.
pub fn check_url(raw: &str) -> UrlCheck {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UrlCheck::Empty;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let Ok(parsed) = Url::parse(&candidate) else {
        return UrlCheck::Invalid;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return UrlCheck::Invalid;
    }

    let host = parsed.host_str().unwrap_or_default();
    let video_id = match host {
        "youtube.com" | "www.youtube.com" if parsed.path() == "/watch" => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        "youtu.be" | "www.youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(ToOwned::to_owned),
        _ => None,
    };

    match video_id {
        Some(id) if is_video_id(&id) => UrlCheck::Valid { video_id: id },
        _ => UrlCheck::Invalid,
    }
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/mqdefault.jpg")
}
