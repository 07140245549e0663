//! Search aggregation against the mock server.

use super::*;
use meli_client::{Condition, SearchFilters, SortOrder, StopReason};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_client_credentials_then_search() {
    let env = TestEnv::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=abc"))
        .and(body_string_contains("client_secret=def"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok123",
            "token_type": "Bearer",
            "expires_in": 21600
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/search"))
        .and(query_param("q", "laptop"))
        .and(query_param("offset", "0"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(0, 50, 3000)))
        .expect(1)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    client.auth().client_credentials_grant().await.unwrap();

    let records = client
        .search()
        .authenticated(true)
        .search_all("laptop", 10, &SearchFilters::new())
        .await
        .unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(records[0].id, "MLM0");
    assert_eq!(records[9].id, "MLM9");
    assert_eq!(env.stored_token()["access_token"], "tok123");
}

#[tokio::test]
async fn test_pages_until_total_is_covered() {
    let env = TestEnv::start().await;

    for (offset, count) in [(0u64, 50u64), (50, 50), (100, 25)] {
        Mock::given(method("GET"))
            .and(path("/sites/MLM/search"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(search_body(offset, count, 125)),
            )
            .expect(1)
            .mount(&env.server)
            .await;
    }

    let mut client = env.client().await;
    let outcome = client
        .search()
        .search_all_detailed("laptop", 500, &SearchFilters::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 125);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.reported_total, Some(125));
    assert!(matches!(outcome.stop_reason, StopReason::Exhausted));
    assert_eq!(outcome.records[124].id, "MLM124");
}

#[tokio::test]
async fn test_failed_page_returns_partial_results() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/search"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(0, 50, 400)))
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/MLM/search"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let outcome = client
        .search()
        .search_all_detailed("laptop", 200, &SearchFilters::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 50);
    assert!(!outcome.is_complete());
    match outcome.stop_reason {
        StopReason::Failed(e) => assert_eq!(e.status(), Some(500)),
        other => panic!("unexpected stop reason: {:?}", other),
    }
}

#[tokio::test]
async fn test_filters_and_site_reach_the_query_string() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLA/search"))
        .and(query_param("q", "iphone 15"))
        .and(query_param("category", "MLA1055"))
        .and(query_param("condition", "used"))
        .and(query_param("sort", "price_asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(0, 2, 2)))
        .expect(1)
        .mount(&env.server)
        .await;

    let mut config = env.config();
    config.site = meli_client::SiteId::Mla;
    let mut client = env.client_with(config).await;

    let filters = SearchFilters::new()
        .with_category("MLA1055")
        .with_condition(Condition::Used)
        .with_sort(SortOrder::PriceAsc);
    let records = client
        .search()
        .search_all("iphone 15", 50, &filters)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_export_after_search() {
    let env = TestEnv::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/MLM/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(0, 5, 5)))
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let records = client
        .search()
        .search_all("gaming laptop", 50, &SearchFilters::new())
        .await
        .unwrap();

    let exporter = meli_client::Exporter::new(client.config().exports_dir.clone());
    let path = exporter
        .export_csv(&records, "gaming laptop")
        .await
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("gaming_laptop_"), "{}", name);
    assert!(name.ends_with(".csv"));
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 6);
}
