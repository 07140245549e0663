//! Authorization Code Flow
//!
//! RFC 6749 Section 4.1 with the optional RFC 7636 PKCE extension.

use crate::config::ClientCredentials;
use crate::core::HttpTransport;
use crate::error::AuthError;
use crate::flows::GrantFlows;
use crate::types::{PkceChallenge, TokenResponse, CODE_CHALLENGE_METHOD};

/// Authorization page URL the user opens in a browser.
pub fn build_authorization_url(
    authorization_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    pkce: Option<&PkceChallenge>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri);

    if let Some(pkce) = pkce {
        query
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
    }

    let separator = if authorization_endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}{}", authorization_endpoint, separator, query.finish())
}

impl<T: HttpTransport> GrantFlows<T> {
    /// Exchange an authorization code. `code_verifier` is required when the
    /// URL carried a PKCE challenge.
    pub async fn exchange_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let mut fields = vec![
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(verifier) = code_verifier {
            fields.push(("code_verifier", verifier));
        }

        self.request_token(&fields).await
    }
}
