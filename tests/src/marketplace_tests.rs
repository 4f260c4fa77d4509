use crate::utils::{spawn_mock_api, test_config};
use anyhow::Result;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use offset_client::{ApiClient, ChainBinding, Error, Marketplace};
use offset_types::{
    BatchSubmission, EsgValue, ListState, Nft, Offset, TransactionId, TransactionStatus,
    TransactionType, to_batch_submission,
};
use serde_json::{json, Value};
use std::collections::HashMap;

async fn offsets(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "req": {
            "account_id": params["account_id"],
            "list_state": params["list_state"],
            "limit": params["limit"].parse::<u32>().unwrap_or_default()
        },
        "offsets": [
            {
                "list_state": "UNLISTED",
                "offset": {
                    "price": 6300,
                    "owner_id": params["account_id"],
                    "nft": {"token_id": "0.0.2220290", "serial_number": 1}
                }
            },
            {
                "list_state": "LISTED",
                "offset": {
                    "price": 6500,
                    "owner_id": params["account_id"],
                    "nft": {"token_id": "0.0.2220290", "serial_number": 2}
                }
            }
        ]
    }))
}

async fn conversion(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    match params.get("type").map(String::as_str) {
        Some("TinybarToCents") => (StatusCode::OK, Json(json!({"rate": 0.000006}))),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "unknown conversion"}))),
    }
}

async fn txn(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "request": {"txn_id": params["txn_id"], "txn_type": params["txn_type"]},
        "state": "APPROVED"
    }))
}

async fn esg(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("token_id").map(String::as_str) != Some("0.0.2220290") {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "no such token"})));
    }
    let serial: u64 = params["serial_number"].parse().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "request": {"token_id": "0.0.2220290", "serial_number": serial},
            "actual_owner": "0.0.1001",
            "retail_price": 6500,
            "min_arm_price": 6300,
            "max_arm_price": 6800,
            "project_category": "Nature Based",
            "project_type": "Forestry",
            "project_name": "Rimba Raya",
            "project_country": "Indonesia",
            "project_region": "Asia",
            "vintage": "2021",
            "credential_subjects": [
                {"title": "Registry", "description": "", "type": "string",
                 "schema_cid": "cid1", "schema_name": "mrv", "value": "Verra"}
            ]
        })),
    )
}

/// Echoes the batch back; purchases also name a transaction.
async fn list_batch(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"received": body}))
}

async fn purchase_batch(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["prices"].as_array().is_some_and(|p| p.iter().any(|v| v == 0)) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "zero price"})));
    }
    (
        StatusCode::OK,
        Json(json!({"transactionId": "0.0.1001@1659651500.5", "received": body})),
    )
}

async fn marketplace() -> Result<Marketplace> {
    let router = Router::new()
        .route("/api/offsets", get(offsets))
        .route("/api/offsets/txn", get(txn))
        .route("/api/offsets/list", post(list_batch))
        .route("/api/offsets/purchase", post(purchase_batch))
        .route("/api/esg", get(esg))
        .route("/api/conversion", get(conversion));
    let config = test_config(&spawn_mock_api(router).await?);
    Ok(Marketplace::new(ApiClient::new(&config)?, &config))
}

#[tokio::test]
async fn test_unlisted_offsets_lose_their_price() -> Result<()> {
    let marketplace = marketplace().await?;
    let data = marketplace.get_offsets("0.0.1001", ListState::All).await?;

    assert_eq!(data.req.account_id, "0.0.1001");
    assert_eq!(data.req.list_state, ListState::All);
    assert_eq!(data.req.limit, 100);

    let offsets = data.into_offsets();
    assert_eq!(offsets.len(), 2);
    assert_eq!(offsets[0].price, None);
    assert_eq!(offsets[1].price, Some(6500.0));
    Ok(())
}

#[tokio::test]
async fn test_conversion_rate() -> Result<()> {
    let marketplace = marketplace().await?;
    let rate = marketplace.get_conversion_rate("TinybarToCents").await?;
    assert!((rate - 0.000006).abs() < f64::EPSILON);

    let err = marketplace.get_conversion_rate("Nope").await.unwrap_err();
    assert!(matches!(err, Error::Marketplace(ref msg) if msg.contains("unknown conversion")));
    Ok(())
}

#[tokio::test]
async fn test_transaction_details_echo_request() -> Result<()> {
    let marketplace = marketplace().await?;
    let id: TransactionId = "0.0.47664997@1659651494.601490554".parse()?;
    let details = marketplace
        .get_transaction_details(&id, TransactionType::Purchase)
        .await?;
    assert_eq!(details.request.txn_id, "0.0.47664997@1659651494.601490554");
    assert_eq!(details.request.txn_type, "PURCHASE");
    assert_eq!(details.status()?, TransactionStatus::Approved);
    Ok(())
}

#[tokio::test]
async fn test_offset_details() -> Result<()> {
    let marketplace = marketplace().await?;
    let details = marketplace.get_offset_details("0.0.2220290", 3).await?;
    assert_eq!(details.request, Nft::new("0.0.2220290", 3));
    assert_eq!(details.project_name, "Rimba Raya");
    assert_eq!(details.max_arm_price, 6800.0);
    assert_eq!(
        details.credential("Registry").map(|c| &c.value),
        Some(&EsgValue::Text("Verra".into()))
    );

    let err = marketplace
        .get_offset_details("0.0.1", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Marketplace(ref msg) if msg.contains("no such token")));
    Ok(())
}

fn batch(price: f64) -> Result<BatchSubmission> {
    let offsets = [Offset {
        price: Some(price),
        owner_id: "0.0.1001".into(),
        nft: Nft::new("0.0.2220290", 4),
    }];
    Ok(to_batch_submission(&offsets, false)?)
}

#[tokio::test]
async fn test_list_offsets_posts_batch() -> Result<()> {
    let marketplace = marketplace().await?;
    let response = marketplace.list_offsets(&batch(6500.0)?).await?;
    assert_eq!(response.transaction_id, None);
    assert_eq!(
        response.details["received"],
        json!({
            "tokenIds": ["000000000000000000000000000000000021e102"],
            "serialIds": [4],
            "prices": [6500]
        })
    );

    // Without a transaction id there is nothing to track.
    let err = marketplace
        .submit(TransactionType::List, &batch(6500.0)?)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Submit(_)));

    let empty = marketplace.list_offsets(&BatchSubmission::default()).await;
    assert!(matches!(empty, Err(Error::Submit(_))));
    Ok(())
}

#[tokio::test]
async fn test_purchase_offsets_returns_transaction() -> Result<()> {
    let marketplace = marketplace().await?;
    let response = marketplace.purchase_offsets(&batch(6300.0)?).await?;
    let expected: TransactionId = "0.0.1001@1659651500.5".parse()?;
    assert_eq!(response.transaction_id, Some(expected));
    assert_eq!(response.details["received"]["prices"], json!([6300]));

    let id = marketplace
        .submit(TransactionType::Purchase, &batch(6300.0)?)
        .await?;
    assert_eq!(id.to_string(), "0.0.1001@1659651500.5");

    let err = marketplace.purchase_offsets(&batch(0.0)?).await.unwrap_err();
    assert!(matches!(err, Error::Submit(ref msg) if msg.contains("zero price")));
    Ok(())
}
