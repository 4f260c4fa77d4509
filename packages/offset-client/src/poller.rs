//! Per-transaction status polling.
//!
//! One task per in-flight transaction. Each task asks the status service for
//! the current status and feeds it to the [`TransactionTracker`] until the
//! record reaches its terminal status, is removed, or the poller is shut down.
//! Failed polls back off exponentially and never drop the record.

use crate::api::backoff_delay;
use crate::config::Config;
use crate::status::StatusSource;
use crate::tracker::TransactionTracker;
use offset_types::{Transaction, TransactionId, TransactionType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct StatusPoller<S: StatusSource> {
    source: Arc<S>,
    tracker: Arc<TransactionTracker>,
    interval: Duration,
    max_interval: Duration,
    cancel: CancellationToken,
    tasks: Mutex<HashMap<TransactionId, PollTask>>,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: Arc<S>, tracker: Arc<TransactionTracker>, config: &Config) -> Self {
        Self::with_intervals(
            source,
            tracker,
            config.poll_interval(),
            config.poll_max_interval(),
        )
    }

    pub fn with_intervals(
        source: Arc<S>,
        tracker: Arc<TransactionTracker>,
        interval: Duration,
        max_interval: Duration,
    ) -> Self {
        Self {
            source,
            tracker,
            interval,
            max_interval: max_interval.max(interval),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        &self.tracker
    }

    /// Start polling `transaction`. Returns `false` when it is already
    /// terminal, already being polled, or the poller has shut down.
    pub fn spawn(&self, transaction: &Transaction) -> bool {
        if transaction.is_terminal() || self.cancel.is_cancelled() {
            return false;
        }
        let id = transaction.transaction_id;
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if tasks.get(&id).is_some_and(|t| !t.handle.is_finished()) {
            return false;
        }

        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(poll_loop(
            self.source.clone(),
            self.tracker.clone(),
            id,
            transaction.txn_type,
            self.interval,
            self.max_interval,
            cancel.clone(),
        ));
        tasks.insert(id, PollTask { cancel, handle });
        debug!(txn_id = %id, "Status poller started");
        true
    }

    /// Resume polling every non-terminal transaction in the session.
    pub fn resume_all(&self) -> usize {
        let resumed = self
            .tracker
            .in_flight()
            .iter()
            .filter(|t| self.spawn(t))
            .count();
        if resumed > 0 {
            info!(resumed, "Resumed status polling");
        }
        resumed
    }

    /// Stop polling one transaction. The record itself is untouched.
    pub fn cancel(&self, transaction_id: &TransactionId) -> bool {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        match tasks.remove(transaction_id) {
            Some(task) => {
                task.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Number of live polling tasks.
    pub fn active_count(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|_, t| !t.handle.is_finished());
        tasks.len()
    }

    /// Wait for every current polling task to finish.
    pub async fn join(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.drain().map(|(_, t)| t.handle).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Status poller task failed");
            }
        }
    }

    /// Cancel all polling and wait for the tasks to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.join().await;
        info!("Status poller stopped");
    }
}

async fn poll_loop<S: StatusSource>(
    source: Arc<S>,
    tracker: Arc<TransactionTracker>,
    transaction_id: TransactionId,
    txn_type: TransactionType,
    interval: Duration,
    max_interval: Duration,
    cancel: CancellationToken,
) {
    let mut failures: u32 = 0;
    loop {
        match tracker.get(&transaction_id) {
            None => {
                debug!(txn_id = %transaction_id, "Transaction no longer tracked");
                return;
            }
            Some(txn) if txn.is_terminal() => {
                debug!(txn_id = %transaction_id, status = %txn.status, "Polling finished");
                return;
            }
            Some(_) => {}
        }

        let result = tokio::select! {
            r = source.fetch_status(&transaction_id, txn_type) => r,
            _ = cancel.cancelled() => {
                debug!(txn_id = %transaction_id, "Polling cancelled");
                return;
            }
        };

        let delay = match result.and_then(|status| tracker.apply(&transaction_id, status)) {
            Ok(Some(_)) => {
                failures = 0;
                interval
            }
            Ok(None) => return,
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = backoff_delay(interval, failures - 1, max_interval);
                warn!(
                    txn_id = %transaction_id,
                    failures,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Status poll failed"
                );
                delay
            }
        };

        if tracker.get(&transaction_id).is_none_or(|t| t.is_terminal()) {
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                debug!(txn_id = %transaction_id, "Polling cancelled");
                return;
            }
        }
    }
}
