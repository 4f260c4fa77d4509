//! Offset transaction tracker.
//!
//! Resumes status polling for every unfinished transaction in the session
//! and exits once all of them are complete.

use offset_client::metrics::METRICS;
use offset_client::{
    ApiClient, Config, FileSessionStore, HttpStatusSource, SessionState, StatusPoller,
    TransactionStore, TransactionTracker,
};
use offset_types::{explorer_url, TransactionId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offset tracker");

    // A missing file is fine; a malformed file or env value is fatal.
    let config = Config::load()?;
    info!(
        api = %config.api_root_url,
        network = %config.network,
        session = %config.session_path,
        "Configuration loaded"
    );

    let store = Arc::new(FileSessionStore::open(&config.session_path)?);
    let session = SessionState::load(store)?;
    let tracker = Arc::new(TransactionTracker::new(TransactionStore::new(session)?));

    let api = ApiClient::new(&config)?;
    let source = Arc::new(HttpStatusSource::new(api));
    let poller = StatusPoller::new(source, tracker.clone(), &config);

    // Completed before this run; not reported again.
    let mut reported: HashSet<TransactionId> = tracker
        .all()
        .iter()
        .filter(|t| t.is_terminal())
        .map(|t| t.transaction_id)
        .collect();

    let resumed = poller.resume_all();
    if resumed == 0 {
        info!("No unfinished transactions in session");
        return Ok(());
    }

    let mut updates = tracker.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let transactions = updates.borrow_and_update().clone();
        for txn in transactions.iter().filter(|t| t.is_terminal()) {
            if reported.insert(txn.transaction_id) {
                let url = explorer_url(&config.explorer_base_url, &txn.transaction_id, &config.network);
                info!(
                    txn_id = %txn.transaction_id,
                    txn_type = %txn.txn_type,
                    status = %txn.status,
                    url = %url,
                    "Transaction complete"
                );
            }
        }
        if transactions.iter().all(|t| t.is_terminal()) {
            info!(count = transactions.len(), "All transactions complete");
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    error!("Transaction store closed");
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    poller.shutdown().await;
    debug!(
        metrics = %METRICS.render(tracker.all().len(), poller.active_count()),
        "Final counters"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
