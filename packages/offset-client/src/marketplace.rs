//! Marketplace endpoints: account offsets, per-offset ESG details,
//! conversion rates, raw transaction details, and the server-side list and
//! purchase calls.

use crate::api::ApiClient;
use crate::config::Config;
use crate::workflow::ChainBinding;
use offset_types::{
    BatchActionResponse, BatchSubmission, ConversionRateResponse, EsgDetailsResponse, ListState,
    OffsetsDataResponse, TransactionId, TransactionStatusResponse, TransactionType,
};
use tracing::{debug, info, warn};

pub struct Marketplace {
    api: ApiClient,
    limit: u32,
}

impl Marketplace {
    pub fn new(api: ApiClient, config: &Config) -> Self {
        Self {
            api,
            limit: config.offsets_limit,
        }
    }

    /// `GET /offsets` for one account. Prices of unlisted offsets are
    /// cleared before the response is returned.
    pub async fn get_offsets(
        &self,
        account_id: &str,
        list_state: ListState,
    ) -> Result<OffsetsDataResponse, crate::Error> {
        let limit = self.limit.to_string();
        let mut data: OffsetsDataResponse = self
            .api
            .get_json(
                "/offsets",
                &[
                    ("account_id", account_id),
                    ("list_state", list_state.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await
            .map_err(|e| crate::Error::Marketplace(e.to_string()))?
            .ok_or_else(|| crate::Error::Marketplace("empty response from GET /offsets".into()))?;

        data.normalize_unlisted_prices();
        info!(
            account_id,
            list_state = %list_state,
            count = data.offsets.len(),
            "Offsets fetched"
        );
        Ok(data)
    }

    /// `GET /conversion?type=<kind>`, e.g. `TinybarToCents`.
    pub async fn get_conversion_rate(&self, kind: &str) -> Result<f64, crate::Error> {
        let response: ConversionRateResponse = self
            .api
            .get_json("/conversion", &[("type", kind)])
            .await
            .map_err(|e| crate::Error::Marketplace(e.to_string()))?
            .ok_or_else(|| {
                crate::Error::Marketplace("empty response from GET /conversion".into())
            })?;
        debug!(kind, rate = response.rate, "Conversion rate fetched");
        Ok(response.rate)
    }

    /// Raw `GET /offsets/txn` answer, state string unparsed.
    pub async fn get_transaction_details(
        &self,
        transaction_id: &TransactionId,
        txn_type: TransactionType,
    ) -> Result<TransactionStatusResponse, crate::Error> {
        let txn_id = transaction_id.to_string();
        self.api
            .get_json(
                "/offsets/txn",
                &[("txn_id", txn_id.as_str()), ("txn_type", txn_type.as_str())],
            )
            .await
            .map_err(|e| crate::Error::StatusPoll(e.to_string()))?
            .ok_or_else(|| crate::Error::StatusPoll("empty response from GET /offsets/txn".into()))
    }

    /// `GET /esg` for one serial of a token class.
    pub async fn get_offset_details(
        &self,
        token_id: &str,
        serial_number: u64,
    ) -> Result<EsgDetailsResponse, crate::Error> {
        let serial = serial_number.to_string();
        let details: EsgDetailsResponse = self
            .api
            .get_json(
                "/esg",
                &[("token_id", token_id), ("serial_number", serial.as_str())],
            )
            .await
            .map_err(|e| crate::Error::Marketplace(e.to_string()))?
            .ok_or_else(|| crate::Error::Marketplace("empty response from GET /esg".into()))?;
        debug!(token_id, serial_number, project = %details.project_name, "Offset details fetched");
        Ok(details)
    }

    /// `POST /offsets/list`.
    pub async fn list_offsets(
        &self,
        batch: &BatchSubmission,
    ) -> Result<BatchActionResponse, crate::Error> {
        self.batch_action("/offsets/list", batch).await
    }

    /// `POST /offsets/purchase`.
    pub async fn purchase_offsets(
        &self,
        batch: &BatchSubmission,
    ) -> Result<BatchActionResponse, crate::Error> {
        self.batch_action("/offsets/purchase", batch).await
    }

    async fn batch_action(
        &self,
        path: &str,
        batch: &BatchSubmission,
    ) -> Result<BatchActionResponse, crate::Error> {
        if batch.is_empty() {
            return Err(crate::Error::Submit(format!("empty batch for POST {path}")));
        }
        let response: Option<BatchActionResponse> = self
            .api
            .post_json(path, batch)
            .await
            .map_err(|e| crate::Error::Submit(e.to_string()))?;
        let response = response.unwrap_or_default();
        info!(
            path,
            items = batch.len(),
            txn_id = ?response.transaction_id,
            "Batch accepted"
        );
        Ok(response)
    }
}

/// Server-submitted listing and purchase. The answer must name the
/// transaction so it can be tracked.
impl ChainBinding for Marketplace {
    async fn submit(
        &self,
        kind: TransactionType,
        batch: &BatchSubmission,
    ) -> Result<TransactionId, crate::Error> {
        let response = match kind {
            TransactionType::List => self.list_offsets(batch).await?,
            TransactionType::Purchase => self.purchase_offsets(batch).await?,
        };
        response.transaction_id.ok_or_else(|| {
            warn!(txn_type = %kind, "Batch answer carried no transaction id");
            crate::Error::Submit(format!("no transaction id in {kind} response"))
        })
    }
}
