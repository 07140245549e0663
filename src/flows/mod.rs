//! OAuth2 Flows
//!
//! Grant protocols against the provider's token endpoint:
//!
//! - **Authorization Code** (RFC 6749 Section 4.1), with optional PKCE (RFC 7636)
//! - **Client Credentials** (RFC 6749 Section 4.4)
//! - **Refresh** (RFC 6749 Section 6)
//!
//! Every grant is a form-encoded POST with the client id and secret in the
//! body. The flows do not persist anything; the authenticator owns state.

pub mod authorization_code;
pub mod client_credentials;
pub mod refresh;

use std::sync::Arc;
use std::time::Duration;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::AuthError;
use crate::types::TokenResponse;

pub use authorization_code::build_authorization_url;

/// Token endpoint client shared by all grants.
pub struct GrantFlows<T: HttpTransport> {
    transport: Arc<T>,
    token_endpoint: String,
    timeout: Duration,
}

impl<T: HttpTransport> GrantFlows<T> {
    pub fn new(transport: Arc<T>, token_endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            token_endpoint: token_endpoint.into(),
            timeout,
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    /// POSTs the grant fields. Anything but 200 is an `ExchangeFailed`
    /// carrying the status and body; callers re-tag it where needed.
    async fn request_token(&self, fields: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let grant_type = fields
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or("unknown");

        let request = HttpRequest::post_form(&self.token_endpoint, fields)
            .with_header("accept", "application/json")
            .with_timeout(self.timeout);

        tracing::debug!(grant_type, endpoint = %self.token_endpoint, "Requesting token");

        let response = self.transport.send(request).await?;

        if response.status != 200 {
            tracing::warn!(grant_type, status = response.status, "Token endpoint rejected grant");
            return Err(AuthError::ExchangeFailed {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| AuthError::InvalidResponse {
            message: e.to_string(),
        })
    }
}
