//! Token Authenticator
//!
//! Owns the token record in memory and is the only writer of the token file.
//!
//! States:
//!
//! - `Unauthenticated`: no token in memory or storage
//! - `PendingAuthorization`: an authorization URL was issued, waiting for the code
//! - `Authenticated`: a token exists and is outside the refresh window
//! - `Expiring`: within the refresh window (default five minutes); the next
//!   [`current_token`](TokenAuthenticator::current_token) refreshes first
//! - `Invalid`: the token endpoint rejected a grant or refresh; everything
//!   fails fast until a fresh grant succeeds
//!
//! Network and storage failures leave the state untouched so the caller can
//! retry.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::MeliConfig;
use crate::core::{HttpTransport, PkceGenerator, RandomPkceGenerator};
use crate::error::{AuthError, StorageError};
use crate::flows::{build_authorization_url, GrantFlows};
use crate::token::TokenStore;
use crate::types::{TokenRecord, TokenResponse};

/// Authenticator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    PendingAuthorization,
    Authenticated,
    Expiring,
    Invalid,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PendingAuthorization => "pending_authorization",
            Self::Authenticated => "authenticated",
            Self::Expiring => "expiring",
            Self::Invalid => "invalid",
        }
    }
}

/// Snapshot for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub state: AuthState,
    pub expires_at: Option<DateTime<Utc>>,
    /// Seconds until expiry.
    pub remaining_secs: Option<i64>,
    pub has_refresh_token: bool,
    pub pkce_pending: bool,
}

/// Which authorization-code variant a pending URL was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Plain,
    Pkce,
}

/// Token lifecycle manager for the three grants plus refresh.
pub struct TokenAuthenticator<T: HttpTransport, S: TokenStore> {
    config: MeliConfig,
    flows: GrantFlows<T>,
    store: Arc<S>,
    pkce_generator: Box<dyn PkceGenerator>,
    token: Option<TokenRecord>,
    pending: Option<Pending>,
    invalid: bool,
    refresh_count: u32,
}

impl<T: HttpTransport, S: TokenStore> TokenAuthenticator<T, S> {
    /// Creates an authenticator and reads any persisted token and pending
    /// PKCE pair. A corrupted token file is treated as absent.
    pub async fn load(
        config: MeliConfig,
        transport: Arc<T>,
        store: Arc<S>,
    ) -> Result<Self, AuthError> {
        let token = match store.load_token().await {
            Ok(token) => token,
            Err(StorageError::Corrupted { path, message }) => {
                tracing::warn!(path = %path.display(), %message, "Ignoring unreadable token file");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let pending = match store.load_pkce().await {
            Ok(Some(_)) => Some(Pending::Pkce),
            Ok(None) => None,
            Err(StorageError::Corrupted { path, message }) => {
                tracing::warn!(path = %path.display(), %message, "Ignoring unreadable PKCE file");
                None
            }
            Err(e) => return Err(e.into()),
        };

        if token.is_some() {
            tracing::debug!("Loaded persisted token");
        }

        let flows = GrantFlows::new(transport, config.token_endpoint(), config.timeout);

        Ok(Self {
            config,
            flows,
            store,
            pkce_generator: Box::new(RandomPkceGenerator::new()),
            token,
            pending,
            invalid: false,
            refresh_count: 0,
        })
    }

    /// Replaces the PKCE generator.
    pub fn with_pkce_generator(mut self, generator: impl PkceGenerator + 'static) -> Self {
        self.pkce_generator = Box::new(generator);
        self
    }

    pub fn state(&self) -> AuthState {
        self.state_at(Utc::now())
    }

    fn state_at(&self, now: DateTime<Utc>) -> AuthState {
        if self.invalid {
            return AuthState::Invalid;
        }
        match (&self.token, self.pending) {
            (Some(token), _) if token.is_expiring_at(now, self.config.refresh_buffer) => {
                AuthState::Expiring
            }
            (Some(_), _) => AuthState::Authenticated,
            (None, Some(_)) => AuthState::PendingAuthorization,
            (None, None) => AuthState::Unauthenticated,
        }
    }

    pub fn status(&self) -> AuthStatus {
        let now = Utc::now();
        AuthStatus {
            state: self.state_at(now),
            expires_at: self.token.as_ref().and_then(|t| t.expires_at),
            remaining_secs: self.token.as_ref().and_then(|t| t.remaining_lifetime(now)),
            has_refresh_token: self
                .token
                .as_ref()
                .map(TokenRecord::has_refresh_token)
                .unwrap_or(false),
            pkce_pending: self.pending == Some(Pending::Pkce),
        }
    }

    /// Number of successful refreshes performed by this instance.
    pub fn refresh_count(&self) -> u32 {
        self.refresh_count
    }

    /// Builds the authorization page URL. With `use_pkce`, a fresh
    /// verifier/challenge pair is generated and persisted, replacing any
    /// earlier pending pair; without it, a stale pair is discarded.
    pub async fn build_authorization_url(
        &mut self,
        redirect_uri: &str,
        use_pkce: bool,
    ) -> Result<String, AuthError> {
        let client_id = self
            .config
            .client_id()
            .ok_or(AuthError::MissingCredentials {
                field: "MELI_CLIENT_ID",
            })?
            .to_string();

        let pkce = if use_pkce {
            let pair = self.pkce_generator.generate();
            self.store.save_pkce(&pair).await?;
            self.pending = Some(Pending::Pkce);
            Some(pair)
        } else {
            self.store.clear_pkce().await?;
            self.pending = Some(Pending::Plain);
            None
        };

        tracing::info!(pkce = use_pkce, "Authorization URL issued");

        Ok(build_authorization_url(
            &self.config.authorization_endpoint(),
            &client_id,
            redirect_uri,
            pkce.as_ref(),
        ))
    }

    /// Exchanges an authorization code. A persisted PKCE verifier, if any,
    /// is sent along and removed once the exchange succeeds.
    pub async fn exchange_code(
        &mut self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        self.exchange(code, redirect_uri, false).await
    }

    /// Like [`exchange_code`](Self::exchange_code) but fails with
    /// `PkceNotFound` when no verifier was persisted.
    pub async fn exchange_code_with_pkce(
        &mut self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AuthError> {
        self.exchange(code, redirect_uri, true).await
    }

    async fn exchange(
        &mut self,
        code: &str,
        redirect_uri: &str,
        require_pkce: bool,
    ) -> Result<TokenRecord, AuthError> {
        let credentials = self.config.credentials()?;
        let pkce = self.store.load_pkce().await?;
        if require_pkce && pkce.is_none() {
            return Err(AuthError::PkceNotFound);
        }

        let verifier = pkce.as_ref().map(|p| p.code_verifier.as_str());
        let result = self
            .flows
            .exchange_code(&credentials, code, redirect_uri, verifier)
            .await;
        let record = self.accept_grant(result).await?;

        if pkce.is_some() {
            if let Err(e) = self.store.clear_pkce().await {
                tracing::warn!(error = %e, "Failed to remove used PKCE verifier");
            }
        }

        tracing::info!(pkce = pkce.is_some(), "Authorization code exchanged");
        Ok(record)
    }

    /// Client-credentials grant.
    pub async fn client_credentials_grant(&mut self) -> Result<TokenRecord, AuthError> {
        let credentials = self.config.credentials()?;
        let result = self.flows.client_credentials(&credentials).await;
        let record = self.accept_grant(result).await?;

        tracing::info!("Client credentials token obtained");
        Ok(record)
    }

    /// Refreshes the current token. The refresh token is kept unless the
    /// provider rotates it.
    pub async fn refresh(&mut self) -> Result<TokenRecord, AuthError> {
        if self.invalid {
            return Err(AuthError::Invalidated);
        }

        let refresh_token = match &self.token {
            None => return Err(AuthError::Unauthenticated),
            Some(token) => match &token.refresh_token {
                Some(refresh_token) => refresh_token.clone(),
                None => {
                    self.invalid = true;
                    tracing::warn!("Refresh needed but no refresh token is stored");
                    return Err(AuthError::NoRefreshToken);
                }
            },
        };

        let credentials = self.config.credentials()?;
        let response = match self.flows.refresh(&credentials, &refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                if is_rejection(&e) {
                    self.invalid = true;
                }
                tracing::warn!(reason = e.reason(), "Token refresh failed");
                return Err(e);
            }
        };

        let record = self.install(&response).await?;
        self.refresh_count += 1;

        tracing::info!("Token refreshed");
        Ok(record)
    }

    /// The in-memory token, refreshed first when inside the refresh window.
    pub async fn current_token(&mut self) -> Result<TokenRecord, AuthError> {
        match self.state() {
            AuthState::Invalid => Err(AuthError::Invalidated),
            AuthState::Unauthenticated | AuthState::PendingAuthorization => {
                Err(AuthError::Unauthenticated)
            }
            AuthState::Expiring => {
                tracing::debug!("Token inside refresh window");
                self.refresh().await
            }
            AuthState::Authenticated => self.token.clone().ok_or(AuthError::Unauthenticated),
        }
    }

    /// Forgets the token and any pending PKCE pair, on disk and in memory.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        self.store.clear_token().await?;
        self.store.clear_pkce().await?;
        self.token = None;
        self.pending = None;
        self.invalid = false;
        tracing::info!("Logged out");
        Ok(())
    }

    async fn accept_grant(
        &mut self,
        result: Result<TokenResponse, AuthError>,
    ) -> Result<TokenRecord, AuthError> {
        match result {
            Ok(response) => self.install(&response).await,
            Err(e) => {
                if is_rejection(&e) {
                    self.invalid = true;
                }
                Err(e)
            }
        }
    }

    /// Makes `response` the current token and persists it. The in-memory
    /// record is replaced even when the write fails.
    async fn install(&mut self, response: &TokenResponse) -> Result<TokenRecord, AuthError> {
        let record = TokenRecord::from_response(response, Utc::now());

        self.token = Some(record.clone());
        self.pending = None;
        self.invalid = false;

        self.store.save_token(&record).await?;
        Ok(record)
    }
}

/// The token endpoint answered, and said no.
fn is_rejection(error: &AuthError) -> bool {
    matches!(
        error,
        AuthError::ExchangeFailed { .. }
            | AuthError::RefreshFailed { .. }
            | AuthError::InvalidResponse { .. }
    )
}
