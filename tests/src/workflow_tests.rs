use crate::utils::{eventually, memory_tracker, spawn_mock_api, test_config};
use anyhow::Result;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use offset_client::oracle::resolve_price_ranges;
use offset_client::workflow::validate_listing_price;
use offset_client::{
    ApiClient, ChainBinding, HttpPriceOracle, HttpStatusSource, StatusPoller, Workflow,
};
use offset_types::{
    to_cents, BatchSubmission, Nft, Offset, PricePreset, RangeError, TransactionId,
    TransactionStatus, TransactionType,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wallet stand-in: records the batch and hands back a fixed transaction id.
#[derive(Default)]
struct StubWallet {
    submitted: Mutex<Vec<(TransactionType, BatchSubmission)>>,
}

impl ChainBinding for StubWallet {
    async fn submit(
        &self,
        kind: TransactionType,
        batch: &BatchSubmission,
    ) -> Result<TransactionId, offset_client::Error> {
        self.submitted.lock().unwrap().push((kind, batch.clone()));
        "0.0.47664997@1659651494.601490554"
            .parse()
            .map_err(offset_client::Error::Identifier)
    }
}

#[derive(Clone, Default)]
struct Ledger {
    polls: Arc<Mutex<u32>>,
}

async fn price(Json(body): Json<Value>) -> Json<Value> {
    let prices: Vec<Value> = body["nfts"]
        .as_array()
        .map(|nfts| {
            nfts.iter()
                .map(|n| json!({"nft_id": n["nft_id"], "min_price": 63, "max_price": 68}))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({"request": body["nfts"], "prices": prices}))
}

async fn txn(
    State(ledger): State<Ledger>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut polls = ledger.polls.lock().unwrap();
    *polls += 1;
    let state = if *polls < 3 { "CREATED" } else { "LISTED" };
    Json(json!({
        "request": {"txn_id": params["txn_id"], "txn_type": params["txn_type"]},
        "state": state
    }))
}

#[tokio::test]
async fn test_list_offsets_end_to_end() -> Result<()> {
    let ledger = Ledger::default();
    let router = Router::new()
        .route("/api/price", post(price))
        .route("/api/offsets/txn", get(txn))
        .with_state(ledger.clone());
    let config = test_config(&spawn_mock_api(router).await?);
    let api = ApiClient::new(&config)?;

    // Resolve bands and pick prices the way the listing form does.
    let staged = vec![
        Offset {
            price: None,
            owner_id: "0.0.1001".into(),
            nft: Nft::new("0.0.2255156", 3),
        },
        Offset {
            price: None,
            owner_id: "0.0.1001".into(),
            nft: Nft::new("0.0.2255156", 4),
        },
    ];
    let nfts: Vec<Nft> = staged.iter().map(|o| o.nft.clone()).collect();
    let ranges = resolve_price_ranges(&HttpPriceOracle::new(api.clone()), &nfts).await?;
    let band = ranges.get("0.0.2255156")?;
    let max = PricePreset::Max.suggested(band).unwrap();
    assert_eq!(max, 68);

    let entered = "0.66";
    let cents = to_cents(entered)?;
    validate_listing_price("0.0.2255156", cents, &ranges)?;
    assert!(matches!(
        validate_listing_price("0.0.2255156", to_cents("0.70")?, &ranges),
        Err(RangeError::OutOfRange { .. })
    ));

    let offsets: Vec<Offset> = staged
        .into_iter()
        .map(|mut o| {
            o.price = Some(0.66);
            o
        })
        .collect();

    let tracker = memory_tracker()?;
    let poller = Arc::new(StatusPoller::new(
        Arc::new(HttpStatusSource::new(api)),
        tracker.clone(),
        &config,
    ));
    let workflow = Workflow::new(StubWallet::default(), poller.clone(), &config);

    let submitted = workflow.list(&offsets, true).await?;
    assert_eq!(submitted.transaction.txn_type, TransactionType::List);
    assert_eq!(
        submitted.explorer_url,
        "https://hashscan.io/#/testnet/transactionsById/0.0.47664997-1659651494-601490554"
    );

    let id = submitted.transaction.transaction_id;
    eventually(Duration::from_secs(10), || {
        tracker.get(&id).map(|t| t.status) == Some(TransactionStatus::Listed)
    })
    .await?;
    poller.join().await;
    assert!(*ledger.polls.lock().unwrap() >= 3);
    Ok(())
}

#[tokio::test]
async fn test_batch_payload_shape() -> Result<()> {
    let tracker = memory_tracker()?;
    let config = test_config("http://127.0.0.1:9/api");
    let poller = Arc::new(StatusPoller::new(
        Arc::new(HttpStatusSource::new(ApiClient::new(&config)?)),
        tracker,
        &config,
    ));
    let wallet = StubWallet::default();
    let workflow = Workflow::new(wallet, poller.clone(), &config);

    workflow
        .purchase(&[
            Offset {
                price: Some(6500.0),
                owner_id: "0.0.1001".into(),
                nft: Nft::new("0.0.2255156", 1),
            },
            Offset {
                price: Some(63.0),
                owner_id: "0.0.1002".into(),
                nft: Nft::new("0.0.2220290", 7),
            },
        ])
        .await?;
    poller.shutdown().await;

    let submitted = workflow.binding().submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    let (kind, batch) = &submitted[0];
    assert_eq!(*kind, TransactionType::Purchase);
    assert_eq!(
        serde_json::to_value(batch)?,
        json!({
            "tokenIds": [
                "0000000000000000000000000000000000226934",
                "000000000000000000000000000000000021e102"
            ],
            "serialIds": [1, 7],
            "prices": [6500, 63]
        })
    );
    Ok(())
}
