//! End-to-end capture: hook -> recorder -> file -> parsed back.

use reqwest_har::har::Har;
use reqwest_har::{
    Exchange, MalformedExchange, PersistError, Recorder, RequestSnapshot, ResponseHook,
    ResponseSnapshot,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

fn exchange(url: &str, status: u16) -> Exchange {
    Exchange {
        request: RequestSnapshot::new("GET", url),
        response: ResponseSnapshot {
            status: Some(status),
            status_text: "OK".to_string(),
            http_version: "HTTP/1.1".to_string(),
            headers: vec![(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )],
            body: br#"{"ok":true}"#.to_vec(),
            remote_addr: None,
        },
        elapsed: Duration::from_millis(42),
    }
}

#[test]
fn captured_entries_round_trip_through_disk() {
    let recorder = Arc::new(Recorder::new());
    let hook = ResponseHook::new(Arc::clone(&recorder));
    for i in 0..3 {
        hook.on_response(exchange(&format!("https://example.com/{i}"), 200))
            .unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let written = recorder.save(dir.path().join("capture")).unwrap();
    assert_eq!(written, dir.path().join("capture.har"));

    let har: Har = serde_json::from_slice(&fs::read(&written).unwrap()).unwrap();
    assert_eq!(har.log.version, "1.2");
    assert_eq!(har.log.entries.len(), 3);
    for (i, entry) in har.log.entries.iter().enumerate() {
        assert_eq!(entry.request.url, format!("https://example.com/{i}"));
        assert_eq!(entry.response.content.text.as_deref(), Some(r#"{"ok":true}"#));
    }
}

#[test]
fn save_is_idempotent_for_unchanged_state() {
    let recorder = Recorder::new();
    let req = RequestSnapshot::new("GET", "https://example.com/");
    let resp = ResponseSnapshot {
        status: Some(200),
        status_text: "OK".to_string(),
        http_version: "HTTP/1.1".to_string(),
        ..Default::default()
    };
    recorder.ingest(reqwest_har::build_entry(&req, &resp, Duration::ZERO).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let first = recorder.save(dir.path().join("same.har")).unwrap();
    let bytes_a = fs::read(&first).unwrap();
    let second = recorder.save(dir.path().join("same.har")).unwrap();
    let bytes_b = fs::read(&second).unwrap();

    assert_eq!(first, second);
    assert_eq!(bytes_a, bytes_b);
}

#[test]
fn save_normalizes_extensions() {
    let recorder = Recorder::new();
    let dir = tempfile::tempdir().unwrap();

    let plain = recorder.save(dir.path().join("x")).unwrap();
    assert_eq!(plain.file_name().unwrap(), "x.har");

    let upper = recorder.save(dir.path().join("x.HAR")).unwrap();
    assert_eq!(upper.file_name().unwrap(), "x.HAR");

    let json = recorder.save(dir.path().join("x.json")).unwrap();
    assert_eq!(json.file_name().unwrap(), "x.json.har");
}

#[test]
fn save_into_missing_directory_is_a_persist_error() {
    let recorder = Recorder::new();
    let dir = tempfile::tempdir().unwrap();
    let err = recorder
        .save(dir.path().join("missing").join("x.har"))
        .unwrap_err();
    assert!(matches!(err, PersistError::Io { .. }));
}

#[test]
fn malformed_exchange_leaves_recorder_untouched() {
    let recorder = Arc::new(Recorder::new());
    let hook = ResponseHook::new(Arc::clone(&recorder));

    let mut broken = exchange("https://example.com/", 200);
    broken.response.status = None;
    let err = hook.on_response(broken).unwrap_err();
    assert!(matches!(err, MalformedExchange::MissingStatus { .. }));
    assert!(recorder.is_empty());
}

#[test]
fn emitted_json_uses_har_field_names() {
    let recorder = Arc::new(Recorder::new());
    let hook = ResponseHook::new(Arc::clone(&recorder));

    let mut redirect = exchange("https://example.com/old", 302);
    redirect.response.headers = vec![("Location".to_string(), "/next".to_string())];
    redirect.response.body = Vec::new();
    hook.on_response(redirect).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = recorder.save(dir.path().join("fields")).unwrap();
    let text = fs::read_to_string(&written).unwrap();

    assert!(text.contains("\"startedDateTime\""));
    assert!(text.contains("\"queryString\""));
    assert!(text.contains("\"redirectURL\": \"/next\""));
    assert!(text.contains("\"headersSize\""));
    assert!(text.contains("\"bodySize\""));
    assert!(text.contains("\"cache\": {}"));
    assert!(!text.contains("\"redirectUrl\""));
}
