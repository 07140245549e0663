//! Token Types
//!
//! Token endpoint response and the persisted token record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token response from the authorization server.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Token type (usually "bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Account the token was issued for (authorization-code grants).
    #[serde(default)]
    pub user_id: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token record owned by the authenticator and persisted to the token file.
///
/// A record without `expires_at` never expires for planning purposes; a 401
/// still triggers a refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl TokenRecord {
    /// Builds a record from a token response received at `now`.
    pub fn from_response(response: &TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));

        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at,
            token_type: response.token_type.clone(),
        }
    }

    /// Past its expiry time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Within `buffer` of its expiry time (or past it).
    pub fn is_expiring_at(&self, now: DateTime<Utc>, buffer: std::time::Duration) -> bool {
        let buffer = Duration::from_std(buffer).unwrap_or_else(|_| Duration::zero());
        self.expires_at
            .map(|exp| exp - now <= buffer)
            .unwrap_or(false)
    }

    /// Seconds until expiry, zero once expired.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|exp| if exp > now { (exp - now).num_seconds() } else { 0 })
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// `Authorization` header value. Always sent as `Bearer`, whatever casing
    /// the provider returned.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: "tok123".to_string(),
            token_type: "bearer".to_string(),
            expires_in,
            refresh_token: Some("ref".to_string()),
            scope: None,
            user_id: None,
        }
    }

    #[test]
    fn test_expires_at_is_now_plus_expires_in() {
        let now = Utc::now();
        let record = TokenRecord::from_response(&response(Some(3600)), now);
        assert_eq!(record.expires_at, Some(now + Duration::seconds(3600)));
        assert_eq!(record.remaining_lifetime(now), Some(3600));
    }

    #[test]
    fn test_expiring_window() {
        let now = Utc::now();
        let record = TokenRecord::from_response(&response(Some(600)), now);
        let buffer = std::time::Duration::from_secs(300);

        assert!(!record.is_expiring_at(now, buffer));
        assert!(record.is_expiring_at(now + Duration::seconds(301), buffer));
        assert!(!record.is_expired_at(now + Duration::seconds(301)));
        assert!(record.is_expired_at(now + Duration::seconds(600)));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let now = Utc::now();
        let record = TokenRecord::from_response(&response(None), now);
        assert!(!record.is_expiring_at(now + Duration::days(365), std::time::Duration::ZERO));
        assert_eq!(record.remaining_lifetime(now), None);
    }

    #[test]
    fn test_token_type_defaults_when_absent() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":10}"#).unwrap();
        assert_eq!(parsed.token_type, "Bearer");
        assert!(parsed.refresh_token.is_none());
    }

    #[test]
    fn test_persisted_shape() {
        let now = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut record = TokenRecord::from_response(&response(Some(60)), now);
        record.refresh_token = None;

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["access_token"], "tok123");
        assert_eq!(json["expires_at"], "2024-05-01T12:01:00Z");
        assert_eq!(json["token_type"], "bearer");
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let record = TokenRecord::from_response(&response(Some(60)), Utc::now());
        let debug = format!("{:?}", record);
        assert!(!debug.contains("tok123"));
        assert!(!debug.contains("\"ref\""));
    }
}
