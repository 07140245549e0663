//! Integration tests using WireMock
//!
//! Each test runs the real reqwest transport and file token store against a
//! local mock server standing in for both the API and the token endpoint.

mod auth;
mod rate_limit;
mod search;

use std::path::PathBuf;
use std::time::Duration;

use meli_client::{MeliClient, MeliConfig, RateLimitRetryConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

/// Cooldown used by the rate-limit tests.
pub const TEST_COOLDOWN: Duration = Duration::from_millis(200);

/// Mock server plus a scratch directory for token and PKCE files.
pub struct TestEnv {
    pub server: MockServer,
    pub dir: TempDir,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.path().join(".meli_token.json")
    }

    pub fn pkce_path(&self) -> PathBuf {
        self.dir.path().join(".pkce_data.json")
    }

    /// Environment-style configuration pointing at the mock server.
    pub fn config(&self) -> MeliConfig {
        let uri = self.server.uri();
        let token_path = self.token_path().display().to_string();
        let pkce_path = self.pkce_path().display().to_string();
        let exports = self.dir.path().join("exports").display().to_string();

        let mut config = MeliConfig::from_lookup(|key| {
            match key {
                "MELI_CLIENT_ID" => Some("abc"),
                "MELI_CLIENT_SECRET" => Some("def"),
                "MELI_API_BASE_URL" | "MELI_AUTH_URL" => Some(uri.as_str()),
                "MELI_TOKEN_PATH" => Some(token_path.as_str()),
                "MELI_PKCE_PATH" => Some(pkce_path.as_str()),
                "EXPORTS_DIR" => Some(exports.as_str()),
                "DELAY_BETWEEN_REQUESTS" => Some("0"),
                "MELI_TIMEOUT" => Some("5"),
                _ => None,
            }
            .map(str::to_string)
        })
        .expect("config");
        config.rate_limit = RateLimitRetryConfig::fixed(TEST_COOLDOWN, 2);
        config
    }

    pub async fn client(&self) -> MeliClient {
        self.client_with(self.config()).await
    }

    pub async fn client_with(&self, config: MeliConfig) -> MeliClient {
        MeliClient::from_config(config).await.expect("client")
    }

    pub fn stored_token(&self) -> Value {
        let raw = std::fs::read_to_string(self.token_path()).expect("token file");
        serde_json::from_str(&raw).expect("token json")
    }
}

/// Search response with `count` listings starting at `offset`.
pub fn search_body(offset: u64, count: u64, total: u64) -> Value {
    let results: Vec<Value> = (offset..offset + count)
        .map(|i| {
            json!({
                "id": format!("MLM{}", i),
                "title": format!("Laptop {}", i),
                "price": 9999.0 + i as f64,
                "currency_id": "MXN",
                "condition": "new",
                "seller": {"id": 500 + i},
                "sold_quantity": i,
                "shipping": {"free_shipping": true}
            })
        })
        .collect();

    json!({
        "site_id": "MLM",
        "paging": {"total": total, "offset": offset, "limit": 50},
        "results": results
    })
}

pub fn token_body(access_token: &str, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 21600,
        "scope": "offline_access read",
        "user_id": 123456
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}
