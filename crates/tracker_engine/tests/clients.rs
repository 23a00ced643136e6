use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracker_core::{FormatChoice, JobId, PreviewQuery, Quality, ReportedStatus};
use tracker_engine::{
    ClientSettings, FailureKind, MetadataClient, ReqwestClient, StatusClient, SubmissionChannel,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, output: &TempDir) -> ReqwestClient {
    ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        csrf_token: Some("tok3n".into()),
        output_dir: output.path().to_path_buf(),
        ..ClientSettings::default()
    })
    .expect("client")
}

fn query() -> PreviewQuery {
    PreviewQuery {
        url: "https://youtu.be/dQw4w9WgXcQ".into(),
        format: FormatChoice::Audio,
        quality: Quality::Medium,
    }
}

#[tokio::test]
async fn status_poll_posts_job_id_with_csrf_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check_progress/"))
        .and(header("X-CSRFToken", "tok3n"))
        .and(body_string_contains("download_id=job42"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"progress": 55, "status": "downloading", "message": "Downloading 55%"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let report = client_for(&server, &output)
        .check_progress(&JobId::from("job42"))
        .await
        .expect("report");
    assert_eq!(report.progress, Some(55));
    assert_eq!(report.status, ReportedStatus::Downloading);
    assert_eq!(report.message.as_deref(), Some("Downloading 55%"));
}

#[tokio::test]
async fn status_poll_http_error_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check_progress/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let err = client_for(&server, &output)
        .check_progress(&JobId::from("job42"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn status_poll_times_out_on_slow_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check_progress/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let client = ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        status_timeout: Duration::from_millis(50),
        output_dir: output.path().to_path_buf(),
        ..ClientSettings::default()
    })
    .unwrap();
    let err = client
        .check_progress(&JobId::from("slow"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn video_info_sends_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video_info/"))
        .and(body_string_contains("format_choice=mp3"))
        .and(body_string_contains("quality=medium"))
        .and(body_string_contains("csrfmiddlewaretoken=tok3n"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"success": true, "videoId": "dQw4w9WgXcQ", "title": "Never Gonna Give You Up"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let info = client_for(&server, &output)
        .video_info(&query())
        .await
        .expect("info");
    assert_eq!(info.video_id.as_deref(), Some("dQw4w9WgXcQ"));
    assert_eq!(info.title, "Never Gonna Give You Up");
}

#[tokio::test]
async fn video_info_error_field_becomes_preview_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video_info/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(r#"{"error": "invalid url"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let err = client_for(&server, &output)
        .video_info(&query())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected(400));
    assert_eq!(err.preview_text(), "invalid url");
}

#[tokio::test]
async fn video_info_error_without_body_gets_generic_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/get_video_info/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let err = client_for(&server, &output)
        .video_info(&query())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(
        err.preview_text(),
        "Could not load video info (server answered 500)."
    );
}

#[tokio::test]
async fn submission_saves_attachment_under_server_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download/"))
        .and(body_string_contains("download_id=job7"))
        .and(body_string_contains("format_choice=mp3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"Song.mp3\"")
                .set_body_raw(b"ID3-audio-bytes".to_vec(), "audio/mpeg"),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let form = query();
    let saved = client_for(&server, &output)
        .submit(&JobId::from("job7"), &form)
        .await
        .expect("saved");
    assert_eq!(saved, output.path().join("Song.mp3"));
    assert_eq!(fs::read(saved).unwrap(), b"ID3-audio-bytes");
}

#[tokio::test]
async fn submission_without_attachment_is_rejected_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>form</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let err = client_for(&server, &output)
        .submit(&JobId::from("job8"), &query())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Rejected(200));
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn rejects_unusable_base_url() {
    let err = ReqwestClient::new(ClientSettings {
        base_url: "not a url".into(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
