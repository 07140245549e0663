//! Client Credentials Flow
//!
//! RFC 6749 Section 4.4. No user interaction and no PKCE; enough for
//! read-only catalog access.

use crate::config::ClientCredentials;
use crate::core::HttpTransport;
use crate::error::AuthError;
use crate::flows::GrantFlows;
use crate::types::TokenResponse;

impl<T: HttpTransport> GrantFlows<T> {
    /// Request an application token with the client id and secret.
    pub async fn client_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.secret()),
        ])
        .await
    }
}
