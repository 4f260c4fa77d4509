use anyhow::Result;
use axum::Router;
use offset_client::{
    Config, MemorySessionStore, SessionState, TransactionStore, TransactionTracker,
};
use std::sync::Arc;
use std::time::Duration;

/// Serve `router` on an ephemeral local port; returns the API root URL.
pub async fn spawn_mock_api(router: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("[mock_api] server stopped: {e}");
        }
    });
    Ok(format!("http://{addr}/api"))
}

/// Fast retries and polling so tests finish in milliseconds.
pub fn test_config(api_root_url: &str) -> Config {
    Config {
        api_root_url: api_root_url.to_string(),
        max_retries: 2,
        retry_base_ms: 5,
        poll_interval_ms: 10,
        poll_max_interval_ms: 40,
        request_timeout_ms: 2_000,
        ..Config::default()
    }
}

pub fn memory_tracker() -> Result<Arc<TransactionTracker>> {
    let session = SessionState::load(Arc::new(MemorySessionStore::new()))?;
    Ok(Arc::new(TransactionTracker::new(TransactionStore::new(
        session,
    )?)))
}

/// Wait for `check` to hold, polling every few milliseconds.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    while !check() {
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
