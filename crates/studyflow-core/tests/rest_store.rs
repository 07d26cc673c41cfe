//! RestStore tests against a mock collaborator.

use chrono::{TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;
use studyflow_core::{RestStore, SessionPatch, SessionQuery, SessionStore, StoreError};

fn session_json(id: &str, label: &str) -> serde_json::Value {
    json!({
        "id": id,
        "userId": "alice",
        "label": label,
        "plannedDurationSecs": 1500,
        "startTime": "2024-01-17T09:00:00Z",
        "endTime": null,
        "isCompleted": false,
        "isPaused": false,
    })
}

#[test]
fn create_session_posts_and_parses() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/sessions")
        .match_body(Matcher::PartialJson(json!({
            "userId": "alice",
            "label": "focus",
            "plannedDurationSecs": 1500,
        })))
        .with_status(201)
        .with_body(session_json("s-1", "focus").to_string())
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap();
    let session = store.create_session("alice", "focus", 1500, start).unwrap();

    assert_eq!(session.id, "s-1");
    assert_eq!(session.planned_duration_secs, 1500);
    assert!(session.is_open());
    mock.assert();
}

#[test]
fn create_session_conflict_maps_to_conflict_error() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/sessions")
        .with_status(409)
        .with_body("open session exists")
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    let err = store
        .create_session("alice", "focus", 1500, Utc::now())
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict));
}

#[test]
fn update_session_patches_only_set_fields() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PATCH", "/sessions/s-1")
        .match_body(Matcher::Json(json!({ "isPaused": true })))
        .with_status(204)
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    store
        .update_session("s-1", SessionPatch::paused(true))
        .unwrap();
    mock.assert();
}

#[test]
fn server_error_surfaces_status_and_body() {
    let mut server = mockito::Server::new();
    server
        .mock("PATCH", "/sessions/s-1")
        .with_status(500)
        .with_body("boom")
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    let err = store
        .update_session("s-1", SessionPatch::paused(true))
        .unwrap_err();
    match err {
        StoreError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[test]
fn active_session_not_found_is_none() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/sessions/active")
        .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
        .with_status(404)
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    assert!(store.active_session("alice").unwrap().is_none());
}

#[test]
fn active_session_null_body_is_none() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/sessions/active")
        .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
        .with_status(200)
        .with_body("null")
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    assert!(store.active_session("alice").unwrap().is_none());
}

#[test]
fn active_session_parses_open_session() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/sessions/active")
        .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
        .with_status(200)
        .with_body(session_json("s-7", "break-short").to_string())
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    let session = store.active_session("alice").unwrap().unwrap();
    assert_eq!(session.id, "s-7");
    assert_eq!(session.label, "break-short");
}

#[test]
fn sessions_forwards_query_filters() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/sessions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("userId".into(), "alice".into()),
            Matcher::UrlEncoded("completedOnly".into(), "true".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(json!([session_json("s-1", "focus"), session_json("s-2", "focus")]).to_string())
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    let query = SessionQuery {
        limit: Some(10),
        completed_only: true,
    };
    let sessions = store.sessions("alice", &query).unwrap();
    assert_eq!(sessions.len(), 2);
    mock.assert();
}

#[test]
fn pause_log_endpoints() {
    let mut server = mockito::Server::new();
    let open = server
        .mock("POST", "/pause-logs")
        .match_body(Matcher::PartialJson(json!({ "sessionId": "s-1" })))
        .with_status(201)
        .create();
    let close = server
        .mock("PATCH", "/pause-logs/s-1/close")
        .match_body(Matcher::PartialJson(json!({})))
        .with_status(204)
        .create();

    let store = RestStore::new(&server.url()).unwrap();
    store.create_pause_log("s-1", Utc::now()).unwrap();
    store.close_pause_log("s-1", Utc::now()).unwrap();
    open.assert();
    close.assert();
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Nothing listens on this port.
    let store = RestStore::new("http://127.0.0.1:9").unwrap();
    let err = store.active_session("alice").unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
}
