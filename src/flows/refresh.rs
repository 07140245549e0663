//! Token Refresh
//!
//! RFC 6749 Section 6 - refresh_token grant.

use crate::config::ClientCredentials;
use crate::core::HttpTransport;
use crate::error::AuthError;
use crate::flows::GrantFlows;
use crate::types::TokenResponse;

impl<T: HttpTransport> GrantFlows<T> {
    /// Exchange a refresh token for a new access token. When the provider
    /// does not rotate the refresh token, the one sent is kept in the
    /// returned response.
    pub async fn refresh(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError> {
        let mut response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.secret()),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| match e {
                AuthError::ExchangeFailed { status, body } => AuthError::RefreshFailed {
                    status: Some(status),
                    body,
                },
                other => other,
            })?;

        if response.refresh_token.is_none() {
            response.refresh_token = Some(refresh_token.to_string());
        }

        Ok(response)
    }
}
