//! Transaction status service.

use crate::api::ApiClient;
use crate::metrics::METRICS;
use offset_types::{TransactionId, TransactionStatus, TransactionStatusResponse, TransactionType};
use std::future::Future;
use std::sync::atomic::Ordering;
use tracing::debug;

/// Source of truth for transaction status. The client never derives a
/// status on its own.
pub trait StatusSource: Send + Sync + 'static {
    fn fetch_status(
        &self,
        transaction_id: &TransactionId,
        txn_type: TransactionType,
    ) -> impl Future<Output = Result<TransactionStatus, crate::Error>> + Send;
}

/// `GET /offsets/txn?txn_id=..&txn_type=..` over the marketplace API.
pub struct HttpStatusSource {
    api: ApiClient,
}

impl HttpStatusSource {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch_status(
        &self,
        transaction_id: &TransactionId,
        txn_type: TransactionType,
    ) -> Result<TransactionStatus, crate::Error> {
        METRICS.status_polls.fetch_add(1, Ordering::Relaxed);
        let fail = |msg: String| {
            METRICS.status_poll_errors.fetch_add(1, Ordering::Relaxed);
            crate::Error::StatusPoll(msg)
        };

        let txn_id = transaction_id.to_string();
        let response: TransactionStatusResponse = self
            .api
            .get_json(
                "/offsets/txn",
                &[("txn_id", txn_id.as_str()), ("txn_type", txn_type.as_str())],
            )
            .await
            .map_err(|e| fail(e.to_string()))?
            .ok_or_else(|| fail("empty response from GET /offsets/txn".into()))?;

        let status = response
            .status()
            .map_err(|e| fail(format!("{txn_id}: {e}")))?;
        // Reject statuses outside this type's lifecycle at the boundary.
        txn_type
            .rank(status)
            .map_err(|e| fail(format!("{txn_id}: {e}")))?;

        debug!(txn_id = %txn_id, %status, "Status fetched");
        Ok(status)
    }
}
