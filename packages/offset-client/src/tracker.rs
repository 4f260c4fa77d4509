//! In-flight transaction records.
//!
//! The [`TransactionStore`] keeps the session's transaction list behind
//! `get`/`set`/`subscribe`. The [`TransactionTracker`] is the only writer of
//! statuses: it applies polled statuses through the status model so a stored
//! status never moves backwards.

use crate::metrics::METRICS;
use crate::session::SessionState;
use offset_types::{Observation, Transaction, TransactionId, TransactionStatus, TransactionType};
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Session-persisted transaction list with change notification.
pub struct TransactionStore {
    session: SessionState,
    sender: watch::Sender<Vec<Transaction>>,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl TransactionStore {
    pub fn new(session: SessionState) -> Result<Self, crate::Error> {
        let transactions = session.transactions()?;
        info!(count = transactions.len(), "Transaction store loaded");
        let (sender, _) = watch::channel(transactions);
        Ok(Self {
            session,
            sender,
            write_lock: Mutex::new(()),
        })
    }

    pub fn get(&self) -> Vec<Transaction> {
        self.sender.borrow().clone()
    }

    /// Persist, then publish to subscribers.
    pub fn set(&self, transactions: Vec<Transaction>) -> Result<(), crate::Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.session.set_transactions(&transactions)?;
        self.sender.send_replace(transactions);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Transaction>> {
        self.sender.subscribe()
    }

    /// Run `f` over the current list; persists and publishes only when it
    /// reports a change.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut Vec<Transaction>) -> (bool, R),
    ) -> Result<R, crate::Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut transactions = self.sender.borrow().clone();
        let (changed, result) = f(&mut transactions);
        if changed {
            self.session.set_transactions(&transactions)?;
            self.sender.send_replace(transactions);
        }
        Ok(result)
    }
}

pub struct TransactionTracker {
    store: TransactionStore,
}

impl TransactionTracker {
    pub fn new(store: TransactionStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Transaction>> {
        self.store.subscribe()
    }

    pub fn get(&self, transaction_id: &TransactionId) -> Option<Transaction> {
        self.store
            .get()
            .into_iter()
            .find(|t| t.transaction_id == *transaction_id)
    }

    pub fn all(&self) -> Vec<Transaction> {
        self.store.get()
    }

    /// Tracked transactions that still need polling.
    pub fn in_flight(&self) -> Vec<Transaction> {
        self.store
            .get()
            .into_iter()
            .filter(|t| !t.is_terminal())
            .collect()
    }

    /// Start tracking a freshly submitted transaction at PENDING. A
    /// transaction that is already tracked is returned unchanged.
    pub fn register(
        &self,
        transaction_id: TransactionId,
        txn_type: TransactionType,
    ) -> Result<Transaction, crate::Error> {
        let (added, txn) = self.store.update(|transactions| {
            if let Some(existing) = transactions
                .iter()
                .find(|t| t.transaction_id == transaction_id)
            {
                return (false, (false, existing.clone()));
            }
            let txn = Transaction::pending(transaction_id, txn_type);
            transactions.push(txn.clone());
            (true, (true, txn))
        })?;
        if added {
            METRICS.transactions_registered.fetch_add(1, Ordering::Relaxed);
            info!(txn_id = %transaction_id, txn_type = %txn_type, "Transaction registered");
        }
        Ok(txn)
    }

    /// Feed a polled status. Returns `None` when the transaction is no
    /// longer tracked.
    pub fn apply(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
    ) -> Result<Option<Observation>, crate::Error> {
        let outcome = self.store.update(|transactions| {
            let Some(txn) = transactions
                .iter_mut()
                .find(|t| t.transaction_id == *transaction_id)
            else {
                return (false, Ok(None));
            };
            match txn.observe(status) {
                Ok(observation) => {
                    let terminal = txn.is_terminal();
                    (observation.changed(), Ok(Some((observation, terminal))))
                }
                Err(e) => (false, Err(e)),
            }
        })?;

        let Some((observation, terminal)) = outcome? else {
            debug!(txn_id = %transaction_id, "Status for untracked transaction ignored");
            return Ok(None);
        };

        match observation {
            Observation::Advanced { from, to } => {
                info!(txn_id = %transaction_id, %from, %to, "Transaction advanced");
                if terminal {
                    METRICS.transactions_completed.fetch_add(1, Ordering::Relaxed);
                    info!(txn_id = %transaction_id, status = %to, "Transaction complete");
                }
            }
            Observation::Relabeled { from, to } => {
                debug!(txn_id = %transaction_id, %from, %to, "Transaction relabeled");
            }
            Observation::Unchanged => {}
            Observation::Regressed { stored, received } => {
                METRICS.status_regressions.fetch_add(1, Ordering::Relaxed);
                warn!(
                    txn_id = %transaction_id,
                    %stored,
                    %received,
                    "Status regression from server ignored"
                );
            }
        }
        Ok(Some(observation))
    }

    /// Stop tracking. Only ever called on explicit user or session action.
    pub fn remove(&self, transaction_id: &TransactionId) -> Result<bool, crate::Error> {
        let removed = self.store.update(|transactions| {
            let before = transactions.len();
            transactions.retain(|t| t.transaction_id != *transaction_id);
            let removed = transactions.len() != before;
            (removed, removed)
        })?;
        if removed {
            info!(txn_id = %transaction_id, "Transaction removed");
        }
        Ok(removed)
    }
}
