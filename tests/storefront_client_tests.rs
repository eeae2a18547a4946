//! Integration tests for the Shopify REST client.
//!
//! These tests verify the not-found and validation-rejected outcomes, the
//! 429 retry policy (server hint vs exponential default), and the adaptive
//! rate governor against a mock Admin API.

use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stock_sync::clients::{ShopifyClient, StorefrontError};
use stock_sync::config::ShopifyCredentials;
use stock_sync::{AccessToken, RatePolicy, ShopDomain, TransportPolicy};

const PRODUCTS_PATH: &str = "/admin/api/2023-04/products.json";
const SET_PATH: &str = "/admin/api/2023-04/inventory_levels/set.json";

fn credentials() -> ShopifyCredentials {
    ShopifyCredentials {
        shop_url: ShopDomain::new("test-shop").unwrap(),
        access_token: AccessToken::new("shpat_test").unwrap(),
        location_id: 655_441_491,
        api_version: "2023-04".to_string(),
    }
}

fn quick_rate_policy() -> RatePolicy {
    RatePolicy {
        base_delay: Duration::from_millis(1),
        moderate_cap: Duration::from_millis(40),
        max_delay: Duration::from_millis(80),
        cooldown: Duration::from_millis(1),
        window: Duration::from_millis(200),
        backoff_start: Duration::from_millis(10),
        backoff_cap: Duration::from_millis(80),
        ..RatePolicy::default()
    }
}

fn client(server: &MockServer) -> ShopifyClient {
    ShopifyClient::with_api_host(
        credentials(),
        server.uri(),
        TransportPolicy {
            request_timeout: Duration::from_millis(500),
            attempts: 3,
            retry_delay: Duration::from_millis(10),
        },
        quick_rate_policy(),
    )
}

fn product_body() -> serde_json::Value {
    serde_json::json!({
        "products": [{
            "id": 123,
            "variants": [{"inventory_item_id": 456, "inventory_quantity": 9}]
        }]
    })
}

// ============================================================================
// Product lookup
// ============================================================================

#[tokio::test]
async fn test_find_by_sku_returns_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(query_param("sku", "SKU-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let handle = client.find_by_sku("SKU-1").await.unwrap().unwrap();

    assert_eq!(handle.product_id, 123);
    assert_eq!(handle.inventory_item_id, 456);
}

#[tokio::test]
async fn test_find_by_sku_404_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert!(client.find_by_sku("SKU-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_sku_empty_list_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"products": []})),
        )
        .mount(&server)
        .await;

    let mut client = client(&server);
    assert!(client.find_by_sku("SKU-1").await.unwrap().is_none());
}

// ============================================================================
// Inventory updates
// ============================================================================

#[tokio::test]
async fn test_set_inventory_posts_expected_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .and(body_partial_json(serde_json::json!({
            "location_id": 655_441_491,
            "inventory_item_id": 456,
            "available": 42,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "inventory_level": {"inventory_item_id": 456, "available": 42}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    client.set_inventory(456, 42, 123).await.unwrap();
}

#[tokio::test]
async fn test_set_inventory_422_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "errors": {"base": ["Inventory item does not have inventory tracking enabled"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let result = client.set_inventory(456, 42, 123).await;

    assert!(matches!(
        result,
        Err(StorefrontError::ValidationRejected(ref e)) if e.inventory_item_id == 456
    ));
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_429_honors_retry_after_and_returns_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "1")
                .set_body_string("rate limited"),
        )
        .expect(5)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let start = std::time::Instant::now();
    let result = client.set_inventory(456, 42, 123).await;

    // The exponential default in this policy would finish in well under a
    // second; four one-second waits prove the server hint was honored.
    assert!(start.elapsed() >= Duration::from_secs(4));
    assert!(matches!(
        result,
        Err(StorefrontError::Status(ref e)) if e.code == 429
    ));
}

#[tokio::test]
async fn test_429_without_hint_uses_exponential_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(5)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let start = std::time::Instant::now();
    let result = client.set_inventory(456, 42, 123).await;

    // 10 + 20 + 40 + 80 ms of backoff, give or take scheduling.
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        result,
        Err(StorefrontError::Status(ref e)) if e.code == 429
    ));
}

#[tokio::test]
async fn test_429_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    client.set_inventory(456, 42, 123).await.unwrap();
}

#[tokio::test]
async fn test_call_limit_header_adapts_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Shopify-Shop-Api-Call-Limit", "36/40")
                .set_body_json(product_body()),
        )
        .mount(&server)
        .await;

    let mut client = client(&server);
    let before = client.current_delay();
    client.find_by_sku("SKU-1").await.unwrap();

    assert!(client.current_delay() > before);
}
