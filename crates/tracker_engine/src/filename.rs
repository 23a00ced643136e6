use tracker_core::{FormatChoice, JobId};

const MAX_STEM_LEN: usize = 80;

/// Name for a saved attachment: the server's `Content-Disposition` filename
/// when it has one, otherwise `{job_id}.{mp3|mp4}`. Always Windows-safe.
pub fn attachment_filename(
    content_disposition: Option<&str>,
    job_id: &JobId,
    format: FormatChoice,
) -> String {
    let fallback = || format!("{}.{}", sanitize_stem(job_id.as_str()), format.extension());
    let Some(raw) = content_disposition.and_then(disposition_filename) else {
        return fallback();
    };

    let (stem, extension) = match raw.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            (stem, ext.to_ascii_lowercase())
        }
        _ => (raw.as_str(), format.extension().to_string()),
    };
    let stem = sanitize_stem(stem);
    if stem == "untitled" {
        return fallback();
    }
    format!("{stem}.{extension}")
}

/// Extracts the plain `filename=` parameter. `filename*=` is ignored.
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    if compacted.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !compacted.is_char_boundary(cut) {
            cut -= 1;
        }
        compacted.truncate(cut);
    }
    if compacted.is_empty() {
        compacted = "untitled".to_string();
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::attachment_filename;
    use tracker_core::{FormatChoice, JobId};

    #[test]
    fn uses_server_filename() {
        let name = attachment_filename(
            Some("attachment; filename=\"Never Gonna Give You Up.mp4\""),
            &JobId::from("abc123"),
            FormatChoice::Video,
        );
        assert_eq!(name, "Never Gonna Give You Up.mp4");
    }

    #[test]
    fn strips_path_separators() {
        let name = attachment_filename(
            Some("attachment; filename=../../etc/passwd"),
            &JobId::from("abc123"),
            FormatChoice::Audio,
        );
        assert!(!name.contains('/'));
        assert!(name.ends_with(".mp3"));
    }

    #[test]
    fn falls_back_to_job_id() {
        let id = JobId::from("abc123");
        assert_eq!(attachment_filename(None, &id, FormatChoice::Audio), "abc123.mp3");
        assert_eq!(
            attachment_filename(Some("attachment"), &id, FormatChoice::Video),
            "abc123.mp4"
        );
        assert_eq!(
            attachment_filename(Some("attachment; filename=\"...\""), &id, FormatChoice::Video),
            "abc123.mp4"
        );
    }

    #[test]
    fn reserved_names_are_suffixed() {
        let name = attachment_filename(
            Some("attachment; filename=con.mp3"),
            &JobId::from("x"),
            FormatChoice::Audio,
        );
        assert_eq!(name, "con_.mp3");
    }
}
