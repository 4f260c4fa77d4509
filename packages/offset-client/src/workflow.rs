//! Listing and purchase submission.
//!
//! Builds the batch all-or-nothing, hands it to the wallet binding, then
//! tracks the returned transaction until the status service reports it
//! complete.

use crate::config::Config;
use crate::poller::StatusPoller;
use crate::status::StatusSource;
use crate::tracker::TransactionTracker;
use offset_types::{
    explorer_url, to_batch_submission, BatchSubmission, Offset, PriceRanges, RangeError,
    Transaction, TransactionId, TransactionType,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

/// Wallet that signs and submits the on-chain call.
pub trait ChainBinding: Send + Sync {
    fn submit(
        &self,
        kind: TransactionType,
        batch: &BatchSubmission,
    ) -> impl Future<Output = Result<TransactionId, crate::Error>> + Send;
}

/// A submitted transaction now being tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub transaction: Transaction,
    pub explorer_url: String,
}

pub struct Workflow<B: ChainBinding, S: StatusSource> {
    binding: B,
    tracker: Arc<TransactionTracker>,
    poller: Arc<StatusPoller<S>>,
    explorer_base: String,
    network: String,
}

impl<B: ChainBinding, S: StatusSource> Workflow<B, S> {
    pub fn new(binding: B, poller: Arc<StatusPoller<S>>, config: &Config) -> Self {
        Self {
            binding,
            tracker: poller.tracker().clone(),
            poller,
            explorer_base: config.explorer_base_url.clone(),
            network: config.network.clone(),
        }
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// List `offsets` for sale. With `convert_to_cents` the staged prices are
    /// dollars; otherwise they must already be whole cents.
    pub async fn list(
        &self,
        offsets: &[Offset],
        convert_to_cents: bool,
    ) -> Result<Submitted, crate::Error> {
        self.submit(TransactionType::List, offsets, convert_to_cents)
            .await
    }

    /// Buy `offsets` at their listed prices (cents).
    pub async fn purchase(&self, offsets: &[Offset]) -> Result<Submitted, crate::Error> {
        self.submit(TransactionType::Purchase, offsets, false).await
    }

    async fn submit(
        &self,
        kind: TransactionType,
        offsets: &[Offset],
        convert_to_cents: bool,
    ) -> Result<Submitted, crate::Error> {
        if offsets.is_empty() {
            return Err(crate::Error::Submit(format!("no offsets to {kind}")));
        }
        let batch = to_batch_submission(offsets, convert_to_cents)?;

        let transaction_id = self.binding.submit(kind, &batch).await.inspect_err(|e| {
            warn!(txn_type = %kind, items = batch.len(), error = %e, "Submission failed");
        })?;
        let transaction = self.tracker.register(transaction_id, kind)?;
        self.poller.spawn(&transaction);

        let explorer_url = explorer_url(&self.explorer_base, &transaction_id, &self.network);
        info!(
            txn_id = %transaction_id,
            txn_type = %kind,
            items = batch.len(),
            url = %explorer_url,
            "Transaction submitted"
        );
        Ok(Submitted {
            transaction,
            explorer_url,
        })
    }
}

/// Check a price entered for `token_id` against its resolved band.
pub fn validate_listing_price(
    token_id: &str,
    cents: i64,
    ranges: &PriceRanges,
) -> Result<(), RangeError> {
    ranges.validate_price(token_id, cents)
}
