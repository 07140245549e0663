//! Token lifecycle against the mock token endpoint.

use super::*;
use chrono::Utc;
use meli_client::{AuthState, FileTokenStore, TokenRecord, TokenStore};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn persist(env: &TestEnv, access_token: &str, refresh_token: Option<&str>) {
    let store = FileTokenStore::new(env.token_path(), env.pkce_path());
    let record = TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at: Some(Utc::now() + chrono::Duration::hours(6)),
        token_type: "Bearer".to_string(),
    };
    store.save_token(&record).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_request_refreshes_and_retries() {
    let env = TestEnv::start().await;
    persist(&env, "old-token", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/items/MLM42"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "invalid_token"})))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("new-token", Some("refresh-2"))),
        )
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items/MLM42"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "MLM42",
            "title": "Monitor 27",
            "price": 4500,
            "seller_id": 77
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    assert_eq!(client.auth_status().state, AuthState::Authenticated);

    let item = client.items().authenticated(true).get("MLM42").await.unwrap();
    assert_eq!(item.record.title, "Monitor 27");
    assert_eq!(client.stats().auth_refreshes, 1);

    let stored = env.stored_token();
    assert_eq!(stored["access_token"], "new-token");
    assert_eq!(stored["refresh_token"], "refresh-2");
}

#[tokio::test]
async fn test_rejected_refresh_is_auth_failed() {
    let env = TestEnv::start().await;
    persist(&env, "old-token", Some("revoked")).await;

    Mock::given(method("GET"))
        .and(path("/items/MLM42"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "message": "Error validating grant"
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    let err = client.items().authenticated(true).get("MLM42").await.unwrap_err();

    assert_eq!(err.reason(), "auth_failed");
    assert_eq!(client.auth_status().state, AuthState::Invalid);
    // the previous record stays on disk
    assert_eq!(env.stored_token()["access_token"], "old-token");
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_before_the_call() {
    let env = TestEnv::start().await;
    let store = FileTokenStore::new(env.token_path(), env.pkce_path());
    store
        .save_token(&TokenRecord {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(2)),
            token_type: "Bearer".to_string(),
        })
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("fresh", None)))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sites/MLM/categories"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&env.server)
        .await;

    let mut client = env.client().await;
    assert_eq!(client.auth_status().state, AuthState::Expiring);

    client
        .executor()
        .request("/sites/MLM/categories", &[], true)
        .await
        .unwrap();

    let stored = env.stored_token();
    assert_eq!(stored["access_token"], "fresh");
    // not rotated by the provider, so the old one is kept
    assert_eq!(stored["refresh_token"], "refresh-1");
}

#[tokio::test]
async fn test_authorization_code_with_pkce() {
    let env = TestEnv::start().await;

    let mut client = env.client().await;
    let url = client
        .auth()
        .build_authorization_url("https://httpbin.org/get", true)
        .await
        .unwrap();

    assert!(url.starts_with(&format!("{}/authorization?", env.server.uri())));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("client_id=abc"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(env.pkce_path().exists());
    assert_eq!(client.auth_status().state, AuthState::PendingAuthorization);

    let pkce: Value =
        serde_json::from_str(&std::fs::read_to_string(env.pkce_path()).unwrap()).unwrap();
    let verifier = pkce["code_verifier"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=TG-abc123"))
        .and(body_string_contains(format!("code_verifier={}", verifier)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("user-token", Some("user-refresh"))),
        )
        .expect(1)
        .mount(&env.server)
        .await;

    // a fresh process picks the verifier up from disk
    let mut client = env.client().await;
    let token = client
        .auth()
        .exchange_code_with_pkce("TG-abc123", "https://httpbin.org/get")
        .await
        .unwrap();

    assert_eq!(token.access_token, "user-token");
    assert_eq!(client.auth_status().state, AuthState::Authenticated);
    assert!(!env.pkce_path().exists());
    assert_eq!(env.stored_token()["refresh_token"], "user-refresh");
}

#[tokio::test]
async fn test_pkce_exchange_without_verifier() {
    let env = TestEnv::start().await;
    let mut client = env.client().await;

    let err = client
        .auth()
        .exchange_code_with_pkce("TG-abc123", "https://httpbin.org/get")
        .await
        .unwrap_err();

    assert_eq!(err.reason(), "pkce_not_found");
}

#[tokio::test]
async fn test_logout_removes_token_file() {
    let env = TestEnv::start().await;
    persist(&env, "tok", None).await;

    let mut client = env.client().await;
    assert_eq!(client.auth_status().state, AuthState::Authenticated);

    client.auth().logout().await.unwrap();

    assert!(!env.token_path().exists());
    assert_eq!(client.auth_status().state, AuthState::Unauthenticated);
}
