//! Live tests against a running NearU server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`nearu-cli migrate`)
//! - The server running (`cargo run -p nearu-server`)
//!
//! Run with: `NEARU_BASE_URL=http://localhost:5000 cargo test -p nearu-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use std::time::{SystemTime, UNIX_EPOCH};

use nearu_integration_tests::base_url;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// An email no earlier run has used.
fn fresh_email(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{tag}-{nanos}@example.test")
}

#[tokio::test]
#[ignore = "Requires a running NearU server"]
async fn test_live_health() {
    let client = Client::new();
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let banner = client
        .get(format!("{base_url}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(banner, "NearU API is running...");
}

#[tokio::test]
#[ignore = "Requires a running NearU server"]
async fn test_live_owner_lifecycle() {
    let client = Client::new();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/api/owners/register"))
        .json(&json!({
            "username": "Live Mart",
            "email": fresh_email("owner"),
            "password": "secret1",
            "address": "12 Main St",
            "shopType": "Grocery",
        }))
        .send()
        .await
        .expect("Failed to register owner");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let unique_id = body["data"]["uniqueId"].as_str().unwrap().to_owned();
    assert!(unique_id.starts_with("NEARU-GRO-"));

    let resp = client
        .post(format!("{base_url}/api/owners/login"))
        .json(&json!({ "uniqueId": unique_id, "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let resp = client
        .post(format!("{base_url}/api/owners/products"))
        .bearer_auth(&token)
        .json(&json!({ "productName": "Live Milk", "productPrice": 40 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let product_id = body["data"]["_id"].as_str().unwrap().to_owned();

    let resp = client
        .put(format!("{base_url}/api/owners/toggle-shop"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isShopOpen"], false);

    let listing: Value = client
        .get(format!("{base_url}/api/owners/all-products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<&str> = listing["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["_id"].as_str())
        .collect();
    assert!(!ids.contains(&product_id.as_str()));

    let resp = client
        .delete(format!("{base_url}/api/owners/products/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base_url}/api/owners/products/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires a running NearU server"]
async fn test_live_user_cannot_reach_owner_routes() {
    let client = Client::new();
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/api/users/register"))
        .json(&json!({
            "username": "live-user",
            "email": fresh_email("user"),
            "password": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let resp = client
        .get(format!("{base_url}/api/owners/my-products"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
