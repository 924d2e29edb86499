use anyhow::Result;
use connectview::core::SessionStore;
use connectview::{CancelToken, GdmsClient, MemorySessionStore, ReportError, Session};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn client(server: &MockServer, store: MemorySessionStore) -> GdmsClient<MemorySessionStore> {
    GdmsClient::new(server.base_url(), store, Duration::from_secs(5)).unwrap()
}

fn gdms_store() -> MemorySessionStore {
    let mut session = Session::default();
    session.set_gdms_token("g-tok".into());
    MemorySessionStore::new(session)
}

#[tokio::test]
async fn test_org_names_accept_mixed_ids() -> Result<()> {
    let server = MockServer::start();
    let orgs_mock = server.mock(|when, then| {
        when.method(GET).path("/gdms/org-names");
        then.status(200).json_body(json!([
            {"id": 101, "organization": "Head Office"},
            {"id": "B-2", "organization": "Branch"}
        ]));
    });

    let orgs = client(&server, MemorySessionStore::default())
        .org_names(&CancelToken::new())
        .await?;

    orgs_mock.assert();
    assert_eq!(orgs.len(), 2);
    assert_eq!(orgs[0].id, "101");
    assert_eq!(orgs[1].organization, "Branch");
    Ok(())
}

#[tokio::test]
async fn test_device_report_streams_with_bearer() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/gdms/report")
            .query_param("orgId", "42")
            .header("Authorization", "Bearer g-tok");
        then.status(200).json_body(json!([
            {"macAddress": "00:0B:82:00:00:01", "deviceStatus": 1},
            {"mac": "00:0B:82:00:00:02", "deviceStatus": 0}
        ]));
    });

    let mut seen = Vec::new();
    let records = client(&server, gdms_store())
        .device_report("42", &CancelToken::new(), |items| seen.push(items.len()))
        .await?;

    report_mock.assert();
    assert_eq!(records.len(), 2);
    assert_eq!(seen.last(), Some(&2));
    Ok(())
}

#[tokio::test]
async fn test_truncated_sip_report_is_malformed() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gdms/sip-report").query_param("orgId", "7");
        then.status(200).body(r#"[{"accountName": "front-desk""#);
    });

    let err = client(&server, MemorySessionStore::default())
        .sip_report("7", &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::MalformedStream { .. }));
    Ok(())
}

#[tokio::test]
async fn test_sip_report_failure_status() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gdms/sip-report");
        then.status(503).body("upstream down");
    });

    let err = client(&server, MemorySessionStore::default())
        .sip_report("7", &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    match err {
        ReportError::RequestFailed { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Failed (503)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_report_requires_organization() -> Result<()> {
    let server = MockServer::start();
    let report_mock = server.mock(|when, then| {
        when.path("/gdms/report");
        then.status(200).json_body(json!([]));
    });

    let err = client(&server, MemorySessionStore::default())
        .device_report("  ", &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::ValidationError { .. }));
    report_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_gdms_login_and_logout() -> Result<()> {
    let server = MockServer::start();
    let store = MemorySessionStore::default();
    let gdms = client(&server, store.clone());

    assert!(gdms.login("   ").await.is_err());
    gdms.login("g-tok").await?;
    assert_eq!(store.load().await?.gdms_token(), Some("g-tok"));

    gdms.logout().await?;
    assert!(!store.load().await?.is_gdms_logged_in());
    Ok(())
}
