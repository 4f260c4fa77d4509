use crate::utils::{spawn_mock_api, test_config};
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use offset_client::oracle::resolve_price_ranges;
use offset_client::{ApiClient, Error, HttpPriceOracle};
use offset_types::{Nft, RangeError, RANGE_PLACEHOLDER};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<Value>>>;

async fn price(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body.clone());
    Json(json!({
        "request": body["nfts"],
        "prices": [
            {
                "nft_id": {"token_id": "0.0.2220290", "serial_number": 1},
                "min_price": 63,
                "max_price": 68
            },
            {
                "nft_id": {"token_id": "0.0.2220291", "serial_number": 4},
                "min_price": 0,
                "max_price": 0,
                "code": 404,
                "message": "no pricing data"
            }
        ]
    }))
}

fn oracle(api_root: &str) -> Result<HttpPriceOracle> {
    Ok(HttpPriceOracle::new(ApiClient::new(&test_config(api_root))?))
}

#[tokio::test]
async fn test_price_ranges_resolved_in_one_request() -> Result<()> {
    let seen: Seen = Arc::default();
    let router = Router::new()
        .route("/api/price", post(price))
        .with_state(seen.clone());
    let oracle = oracle(&spawn_mock_api(router).await?)?;

    let nfts = vec![
        Nft::new("0.0.2220290", 1),
        Nft::new("0.0.2220290", 2),
        Nft::new("0.0.2220291", 4),
        Nft::new("0.0.NOTFOUND", 9),
    ];
    let ranges = resolve_price_ranges(&oracle, &nfts).await?;

    assert_eq!(ranges.range_for_id("0.0.2220290")?, "$0.63 - $0.68");
    assert_eq!(ranges.range_for_id("0.0.2220291")?, RANGE_PLACEHOLDER);
    assert!(matches!(
        ranges.range_for_id("0.0.NOTFOUND"),
        Err(RangeError::NotFound(_))
    ));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        json!({"nfts": [
            {"nft_id": {"token_id": "0.0.2220290", "serial_number": 1}},
            {"nft_id": {"token_id": "0.0.2220291", "serial_number": 4}},
            {"nft_id": {"token_id": "0.0.NOTFOUND", "serial_number": 9}}
        ]})
    );
    Ok(())
}

#[tokio::test]
async fn test_oracle_error_with_empty_body_names_the_call() -> Result<()> {
    let router = Router::new().route("/api/price", post(|| async { StatusCode::BAD_REQUEST }));
    let oracle = oracle(&spawn_mock_api(router).await?)?;

    let err = resolve_price_ranges(&oracle, &[Nft::new("0.0.1", 1)])
        .await
        .unwrap_err();
    match &err {
        Error::Oracle(msg) => assert!(msg.contains("400 error from POST /price"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_recoverable());
    Ok(())
}

#[tokio::test]
async fn test_oracle_error_text_is_surfaced() -> Result<()> {
    let router = Router::new().route(
        "/api/price",
        post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "token class unknown") }),
    );
    let oracle = oracle(&spawn_mock_api(router).await?)?;

    let err = resolve_price_ranges(&oracle, &[Nft::new("0.0.1", 1)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("token class unknown"));
    Ok(())
}

#[tokio::test]
async fn test_transient_failure_is_retried() -> Result<()> {
    let calls = Arc::new(Mutex::new(0u32));
    let router = Router::new()
        .route(
            "/api/price",
            post(|State(calls): State<Arc<Mutex<u32>>>| async move {
                let mut calls = calls.lock().unwrap();
                *calls += 1;
                if *calls == 1 {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
                } else {
                    (StatusCode::OK, Json(json!({"request": [], "prices": []})))
                }
            }),
        )
        .with_state(calls.clone());
    let oracle = oracle(&spawn_mock_api(router).await?)?;

    let ranges = resolve_price_ranges(&oracle, &[Nft::new("0.0.1", 1)]).await?;
    assert!(ranges.is_empty());
    assert_eq!(*calls.lock().unwrap(), 2);
    Ok(())
}

#[tokio::test]
async fn test_retries_stop_after_max_retries() -> Result<()> {
    let calls = Arc::new(Mutex::new(0u32));
    let router = Router::new()
        .route(
            "/api/price",
            post(|State(calls): State<Arc<Mutex<u32>>>| async move {
                *calls.lock().unwrap() += 1;
                StatusCode::SERVICE_UNAVAILABLE
            }),
        )
        .with_state(calls.clone());
    let config = test_config(&spawn_mock_api(router).await?);
    let oracle = HttpPriceOracle::new(ApiClient::new(&config)?);

    let err = resolve_price_ranges(&oracle, &[Nft::new("0.0.1", 1)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503 error from POST /price"));
    // First attempt plus every configured retry.
    assert_eq!(*calls.lock().unwrap(), config.max_retries + 1);
    Ok(())
}
