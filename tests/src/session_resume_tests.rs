use crate::utils::{spawn_mock_api, test_config};
use anyhow::Result;
use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use offset_client::{
    ApiClient, FileSessionStore, HttpStatusSource, SessionState, StatusPoller, TransactionStore,
    TransactionTracker,
};
use offset_types::{ListState, TransactionId, TransactionStatus, TransactionType};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn open_tracker(path: &Path) -> Result<(SessionState, Arc<TransactionTracker>)> {
    let session = SessionState::load(Arc::new(FileSessionStore::open(path)?))?;
    let tracker = Arc::new(TransactionTracker::new(TransactionStore::new(
        session.clone(),
    )?));
    Ok((session, tracker))
}

async fn purchased(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "request": {"txn_id": params["txn_id"], "txn_type": params["txn_type"]},
        "state": "PURCHASED"
    }))
}

#[tokio::test]
async fn test_session_defaults_written_on_first_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    let (session, _) = open_tracker(&path)?;

    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path)?)?;
    assert_eq!(
        on_disk,
        json!({"accountId": "", "listType": "ALL", "transactions": []})
    );

    session.set_list_type(ListState::Unlisted)?;
    let (reopened, _) = open_tracker(&path)?;
    assert_eq!(reopened.list_type(), ListState::Unlisted);
    Ok(())
}

#[tokio::test]
async fn test_unfinished_transactions_resume_after_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("session.json");
    let pending: TransactionId = "0.0.47664997@1659651494.601490554".parse()?;
    let done: TransactionId = "0.0.1001@1659651500.000000001".parse()?;

    {
        let (session, tracker) = open_tracker(&path)?;
        session.set_account_id("0.0.1001")?;
        tracker.register(pending, TransactionType::Purchase)?;
        tracker.register(done, TransactionType::List)?;
        tracker.apply(&done, TransactionStatus::Listed)?;
    }

    let router = Router::new().route("/api/offsets/txn", get(purchased));
    let config = test_config(&spawn_mock_api(router).await?);
    let (session, tracker) = open_tracker(&path)?;
    assert_eq!(session.account_id(), "0.0.1001");
    assert_eq!(tracker.in_flight().len(), 1);

    let poller = StatusPoller::new(
        Arc::new(HttpStatusSource::new(ApiClient::new(&config)?)),
        tracker.clone(),
        &config,
    );
    assert_eq!(poller.resume_all(), 1);
    tokio::time::timeout(Duration::from_secs(10), poller.join()).await?;

    let (_, after) = open_tracker(&path)?;
    assert_eq!(
        after.get(&pending).map(|t| t.status),
        Some(TransactionStatus::Purchased)
    );
    assert_eq!(
        after.get(&done).map(|t| t.status),
        Some(TransactionStatus::Listed)
    );
    Ok(())
}
