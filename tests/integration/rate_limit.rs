//! Pacing and 429 handling with real time.

use super::*;
use std::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_throttled_request_cools_down_then_succeeds() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "MLM1747", "name": "Autos"}])),
        )
        .expect(1)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let started = Instant::now();
    let categories = client.catalog().categories().await.unwrap();

    assert!(started.elapsed() >= TEST_COOLDOWN);
    assert_eq!(categories.len(), 1);
    assert_eq!(client.stats().http_calls, 2);
    assert_eq!(client.stats().rate_limit.retries, 1);
}

#[tokio::test]
async fn test_retry_after_is_capped_by_policy() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "120"))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let started = Instant::now();
    client.catalog().categories().await.unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= TEST_COOLDOWN);
    assert!(elapsed < Duration::from_secs(10), "waited {:?}", elapsed);
}

#[tokio::test]
async fn test_persistent_throttling_exhausts_retries() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let err = client.catalog().categories().await.unwrap_err();

    assert_eq!(err.reason(), "rate_limited");
    assert!(matches!(
        err,
        meli_client::ApiError::RateLimitExhausted { attempts: 3 }
    ));
    assert_eq!(client.stats().rate_limit.exhausted, 1);
}

#[tokio::test]
async fn test_consecutive_requests_are_spaced() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&env.server)
        .await;

    let mut config = env.config();
    config.min_request_interval = Duration::from_millis(150);
    let mut client = env.client_with(config).await;

    let started = Instant::now();
    for _ in 0..3 {
        client.catalog().categories().await.unwrap();
    }

    // the first call goes out immediately, the next two wait
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let err = client.catalog().categories().await.unwrap_err();

    assert_eq!(err.reason(), "http_error");
    assert_eq!(err.status(), Some(503));
}
