//! Price range resolution against the pricing oracle.

use crate::api::ApiClient;
use crate::metrics::METRICS;
use offset_types::{Nft, PriceRangeRequest, PriceRangeResponse, PriceRanges};
use std::future::Future;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

/// The external pricing oracle.
pub trait PriceOracle: Send + Sync {
    /// One batched request; the oracle answers one entry per identifier.
    fn get_price(
        &self,
        request: &PriceRangeRequest,
    ) -> impl Future<Output = Result<PriceRangeResponse, crate::Error>> + Send;
}

/// `POST /price` over the marketplace API.
pub struct HttpPriceOracle {
    api: ApiClient,
}

impl HttpPriceOracle {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl PriceOracle for HttpPriceOracle {
    async fn get_price(
        &self,
        request: &PriceRangeRequest,
    ) -> Result<PriceRangeResponse, crate::Error> {
        METRICS.oracle_requests.fetch_add(1, Ordering::Relaxed);
        let response: Option<PriceRangeResponse> = self
            .api
            .post_json("/price", request)
            .await
            .map_err(|e| {
                METRICS.oracle_errors.fetch_add(1, Ordering::Relaxed);
                crate::Error::Oracle(e.to_string())
            })?;
        response.ok_or_else(|| {
            METRICS.oracle_errors.fetch_add(1, Ordering::Relaxed);
            crate::Error::Oracle("empty response from POST /price".into())
        })
    }
}

/// Fetch acceptable price bands for every distinct token among `nfts`.
///
/// Per-item failures come back as entries with a `code`/`message` and no
/// bounds; identifiers the oracle skipped are simply absent from the result.
pub async fn resolve_price_ranges<O: PriceOracle>(
    oracle: &O,
    nfts: &[Nft],
) -> Result<PriceRanges, crate::Error> {
    let request = PriceRangeRequest::for_nfts(nfts);
    if request.is_empty() {
        return Ok(PriceRanges::default());
    }

    let response = oracle.get_price(&request).await?;
    let requested = request.nfts.len();
    let answered = response.prices.len();
    if answered != requested {
        warn!(requested, answered, "Pricing oracle answer count mismatch");
    }

    let ranges = PriceRanges::from_prices(response.prices).map_err(|e| {
        METRICS.oracle_errors.fetch_add(1, Ordering::Relaxed);
        crate::Error::Oracle(e.to_string())
    })?;
    let unpriced = ranges.iter().filter(|r| r.bounds().is_none()).count();
    info!(requested, resolved = ranges.len(), unpriced, "Price ranges resolved");
    Ok(ranges)
}
