mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use tcg_console::http::{Params, Upload, REQUEST_FAILED_NOTICE, SESSION_EXPIRED_NOTICE};
use tcg_console::storage::{MemoryStorage, Storage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_INFO_KEY, USER_NAME_KEY};
use tcg_console::ConsoleError;

use common::{MockBackend, RecordingNotifier, ACCESS_TOKEN};

#[tokio::test]
async fn envelope_data_is_unwrapped() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client(MemoryStorage::shared(), Arc::new(RecordingNotifier::default()));

    let modules: Vec<String> = client.get("/requirements/modules").await?;
    assert_eq!(modules, vec!["auth".to_string(), "billing".to_string()]);
    Ok(())
}

#[tokio::test]
async fn business_error_carries_code_and_notifies() -> Result<()> {
    let backend = MockBackend::start().await?;
    let notifier = Arc::new(RecordingNotifier::default());
    let client = backend.client(MemoryStorage::shared(), notifier.clone());

    let err = client.get::<Value>("/business").await.unwrap_err();
    match err {
        ConsoleError::Business { code, ref message } => {
            assert_eq!(code, 4001);
            assert_eq!(message, "需求不存在");
        }
        other => panic!("expected business error, got {:?}", other),
    }
    assert_eq!(notifier.notices(), vec!["需求不存在".to_string()]);
    Ok(())
}

#[tokio::test]
async fn unauthorized_clears_session_keys() -> Result<()> {
    let backend = MockBackend::start().await?;
    let storage = MemoryStorage::shared();
    storage.set(ACCESS_TOKEN_KEY, ACCESS_TOKEN)?;
    storage.set(REFRESH_TOKEN_KEY, "refresh")?;
    storage.set(USER_INFO_KEY, r#"{"id":1,"username":"alice"}"#)?;
    storage.set(USER_NAME_KEY, "alice")?;

    let notifier = Arc::new(RecordingNotifier::default());
    let client = backend.client(storage.clone(), notifier.clone());

    let err = client.get::<Value>("/expired").await.unwrap_err();
    assert!(matches!(err, ConsoleError::SessionExpired));
    assert!(err.is_auth_error());

    assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(storage.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(storage.get(USER_INFO_KEY), None);
    // not part of the session triple
    assert_eq!(storage.get(USER_NAME_KEY).as_deref(), Some("alice"));

    assert_eq!(notifier.notices(), vec![SESSION_EXPIRED_NOTICE.to_string()]);
    Ok(())
}

#[tokio::test]
async fn http_error_prefers_server_message() -> Result<()> {
    let backend = MockBackend::start().await?;
    let notifier = Arc::new(RecordingNotifier::default());
    let client = backend.client(MemoryStorage::shared(), notifier.clone());

    let err = client.get::<Value>("/broken").await.unwrap_err();
    match err {
        ConsoleError::Http { status, ref message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("expected http error, got {:?}", other),
    }
    assert_eq!(notifier.notices(), vec!["database down".to_string()]);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_an_http_error() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client(MemoryStorage::shared(), Arc::new(RecordingNotifier::default()));

    let err = client.get::<Value>("/does-not-exist").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Http { status: 404, .. }));
    assert_ne!(err.error_code(), "SESSION_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_reported() -> Result<()> {
    let port = portpicker::pick_unused_port().expect("free port");
    let mut config = tcg_console::config::ConsoleConfig::from_env();
    config.api.base_url = format!("http://127.0.0.1:{}/api", port);
    config.api.timeout_secs = 2;

    let notifier = Arc::new(RecordingNotifier::default());
    let client = tcg_console::http::ApiClient::new(&config.api, MemoryStorage::shared(), notifier.clone())?;

    let err = client.get::<Value>("/requirements").await.unwrap_err();
    assert_eq!(err.error_code(), "NETWORK_ERROR");
    assert_eq!(notifier.notices().len(), 1);
    assert_ne!(notifier.notices()[0], REQUEST_FAILED_NOTICE);
    Ok(())
}

#[tokio::test]
async fn blob_download_bypasses_envelope() -> Result<()> {
    let backend = MockBackend::start().await?;
    let storage = MemoryStorage::shared();
    storage.set(ACCESS_TOKEN_KEY, ACCESS_TOKEN)?;
    let client = backend.client(storage, Arc::new(RecordingNotifier::default()));

    let blob = client.get_blob("/testcases/export", &Params::new()).await?;
    assert_eq!(blob.bytes, vec![0x50, 0x4b, 0x03, 0x04]);
    assert_eq!(blob.filename.as_deref(), Some("testcases.xlsx"));
    assert!(blob
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("spreadsheetml")));
    Ok(())
}

#[tokio::test]
async fn upload_sends_file_field() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client(MemoryStorage::shared(), Arc::new(RecordingNotifier::default()));

    let upload = Upload::new("cases.xlsx", vec![1, 2, 3, 4, 5]).with_mime("application/octet-stream");
    let result: Value = client.upload("/testcases/import", upload).await?;
    assert_eq!(result["imported"], 1);

    let uploads = backend.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("cases.xlsx".to_string(), 5)]);
    Ok(())
}
