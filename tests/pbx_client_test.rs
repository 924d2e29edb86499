use anyhow::Result;
use connectview::core::SessionStore;
use connectview::{CancelToken, DateRange, MemorySessionStore, PbxClient, ReportError, Session};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;
use std::time::Duration;

fn logged_in_store() -> MemorySessionStore {
    let mut session = Session::default();
    session.set_pbx_login("tok-1".into(), "alice".into(), "secret".into());
    MemorySessionStore::new(session)
}

fn client(server: &MockServer, store: MemorySessionStore) -> PbxClient<MemorySessionStore> {
    PbxClient::new(server.base_url(), store, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_login_stores_token_and_credentials() -> Result<()> {
    let server = MockServer::start();
    let login_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/pbx/auth/login")
            .json_body(json!({"username": "alice", "password": "secret"}));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"token": "tok-1"}));
    });

    let store = MemorySessionStore::default();
    let pbx = client(&server, store.clone());
    pbx.login("alice", "secret").await?;

    login_mock.assert();
    let credentials = store.load().await?.pbx_credentials().unwrap();
    assert_eq!(credentials.token, "tok-1");
    assert_eq!(credentials.username, "alice");
    assert_eq!(credentials.password, "secret");
    Ok(())
}

#[tokio::test]
async fn test_login_without_token_fails() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/pbx/auth/login");
        then.status(200).json_body(json!({"message": "ok"}));
    });

    let store = MemorySessionStore::default();
    let err = client(&server, store.clone())
        .login("alice", "secret")
        .await
        .unwrap_err();

    match err {
        ReportError::AuthFailed { message } => assert_eq!(message, "No token returned by server"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.load().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_login_rejection_uses_body_or_status() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/pbx/auth/login")
            .json_body(json!({"username": "alice", "password": "wrong"}));
        then.status(403).body("Invalid credentials");
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/pbx/auth/login")
            .json_body(json!({"username": "bob", "password": "x"}));
        then.status(500);
    });

    let pbx = client(&server, MemorySessionStore::default());

    let err = pbx.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err.user_friendly_message(), "Invalid credentials");

    let err = pbx.login("bob", "x").await.unwrap_err();
    assert_eq!(err.user_friendly_message(), "Login failed (500)");
    Ok(())
}

#[tokio::test]
async fn test_login_requires_both_fields() -> Result<()> {
    let server = MockServer::start();
    let login_mock = server.mock(|when, then| {
        when.method(POST).path("/pbx/auth/login");
        then.status(200).json_body(json!({"token": "t"}));
    });

    let err = client(&server, MemorySessionStore::default())
        .login("alice", "")
        .await
        .unwrap_err();

    assert_eq!(err.user_friendly_message(), "Please enter username and password");
    login_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_fetch_without_session_makes_no_request() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.path("/api/users/filtered-report");
        then.status(200).json_body(json!([]));
    });

    let err = client(&server, MemorySessionStore::default())
        .fetch_report(&DateRange::default(), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::NotAuthenticated));
    report_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_fetch_sends_range_token_and_body() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/users/filtered-report")
            .query_param("from", "2024-01-01")
            .query_param("to", "2024-01-31")
            .header("Authorization", "Bearer tok-1")
            .json_body(json!({
                "username": "alice",
                "password": "secret",
                "from": "2024-01-01",
                "to": "2024-01-31"
            }));
        then.status(200).json_body(json!({
            "data": [
                {"caller": "1001", "callee": "2001"},
                {"caller": "1002", "callee": "2002"}
            ]
        }));
    });

    let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31"))?;
    let records = client(&server, logged_in_store())
        .fetch_report(&range, &CancelToken::new())
        .await?;

    report_mock.assert();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].data["caller"], json!("1002"));
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_clears_token_only() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/api/users/filtered-report");
        then.status(401).body("expired");
    });

    let store = logged_in_store();
    let err = client(&server, store.clone())
        .fetch_report(&DateRange::default(), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Unauthorized));
    assert_eq!(err.to_string(), "Unauthorized — please login again.");
    let session = store.load().await?;
    assert!(!session.is_pbx_logged_in());
    assert_eq!(session.pbx_username.as_deref(), Some("alice"));
    Ok(())
}

#[tokio::test]
async fn test_server_error_reports_body_text() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/api/users/filtered-report");
        then.status(502).body("Failed to fetch CDR");
    });

    let err = client(&server, logged_in_store())
        .fetch_report(&DateRange::default(), &CancelToken::new())
        .await
        .unwrap_err();

    match err {
        ReportError::RequestFailed { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Failed to fetch CDR");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_unexpected_payload_is_an_empty_report() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/api/users/filtered-report");
        then.status(200).json_body(json!({"rows": [{"caller": "1"}]}));
    });

    let records = client(&server, logged_in_store())
        .fetch_report(&DateRange::default(), &CancelToken::new())
        .await?;
    assert!(records.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_inverted_range_is_rejected_before_fetch() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.path("/api/users/filtered-report");
        then.status(200).json_body(json!([]));
    });

    let range = DateRange {
        from: chrono::NaiveDate::from_ymd_opt(2024, 2, 10),
        to: chrono::NaiveDate::from_ymd_opt(2024, 2, 1),
    };
    let err = client(&server, logged_in_store())
        .fetch_report(&range, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.user_friendly_message(), "\"To\" must be on/after \"From\".");
    report_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_fetch_is_not_sent() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.path("/api/users/filtered-report");
        then.status(200).json_body(json!([]));
    });

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = client(&server, logged_in_store())
        .fetch_report(&DateRange::default(), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    report_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_state_even_when_backend_fails() -> Result<()> {
    let server = MockServer::start();
    let logout_mock = server.mock(|when, then| {
        when.method(POST).path("/pbx/auth/logout");
        then.status(500);
    });

    let store = logged_in_store();
    client(&server, store.clone()).logout().await?;

    logout_mock.assert();
    assert!(store.load().await?.pbx_credentials().is_none());
    assert!(store.load().await?.pbx_username.is_none());
    Ok(())
}

#[tokio::test]
async fn test_null_report_entries_are_kept() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/api/users/filtered-report");
        then.status(200)
            .json_body(json!({"data": [{"caller": "1001"}, null, "junk"]}));
    });

    let records = client(&server, logged_in_store())
        .fetch_report(&DateRange::default(), &CancelToken::new())
        .await?;

    assert_eq!(records.len(), 3);
    assert!(records[1].data.is_empty());
    assert!(records[2].data.is_empty());
    Ok(())
}
