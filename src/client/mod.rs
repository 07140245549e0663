//! MercadoLibre client.
//!
//! [`MeliClient`] ties configuration, the token authenticator and the request
//! executor together and hands out service accessors.
//!
//! ```rust,ignore
//! use meli_client::{MeliClient, MeliConfig, SearchFilters};
//!
//! let mut client = MeliClient::from_config(MeliConfig::from_env()?).await?;
//! client.auth().client_credentials_grant().await?;
//! let records = client
//!     .search()
//!     .authenticated(true)
//!     .search_all("iPhone 15", 100, &SearchFilters::new())
//!     .await?;
//! ```

pub mod executor;

pub use executor::{ExecutorStats, RequestExecutor};

use std::sync::Arc;

use crate::config::MeliConfig;
use crate::core::{HttpTransport, ReqwestHttpTransport};
use crate::error::MeliResult;
use crate::services::{CatalogService, ItemsService, SearchService};
use crate::token::{AuthStatus, FileTokenStore, TokenAuthenticator, TokenStore};

/// Client for the marketplace API.
pub struct MeliClient<T: HttpTransport = ReqwestHttpTransport, S: TokenStore = FileTokenStore> {
    config: MeliConfig,
    executor: RequestExecutor<T, S>,
}

impl MeliClient<ReqwestHttpTransport, FileTokenStore> {
    /// Creates a client with the reqwest transport and the token files named
    /// in `config`.
    pub async fn from_config(config: MeliConfig) -> MeliResult<Self> {
        let transport = Arc::new(
            ReqwestHttpTransport::new(config.timeout).map_err(crate::error::ApiError::from)?,
        );
        let store = Arc::new(FileTokenStore::new(
            config.token_path.clone(),
            config.pkce_path.clone(),
        ));
        Self::with_parts(config, transport, store).await
    }
}

impl<T: HttpTransport, S: TokenStore> MeliClient<T, S> {
    /// Creates a client from explicit transport and storage.
    pub async fn with_parts(config: MeliConfig, transport: Arc<T>, store: Arc<S>) -> MeliResult<Self> {
        config.validate()?;
        let authenticator = TokenAuthenticator::load(config.clone(), transport.clone(), store).await?;
        let executor = RequestExecutor::new(&config, transport, authenticator);

        tracing::debug!(site = %config.site, base_url = %config.api_base_url, "Client created");
        Ok(Self { config, executor })
    }

    pub fn config(&self) -> &MeliConfig {
        &self.config
    }

    /// Token authenticator (grants, refresh, logout).
    pub fn auth(&mut self) -> &mut TokenAuthenticator<T, S> {
        self.executor.authenticator_mut()
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.executor.authenticator().status()
    }

    pub fn executor(&mut self) -> &mut RequestExecutor<T, S> {
        &mut self.executor
    }

    pub fn stats(&self) -> &ExecutorStats {
        self.executor.stats()
    }

    /// Search on the configured site.
    pub fn search(&mut self) -> SearchService<'_, T, S> {
        SearchService::new(&mut self.executor, self.config.site)
    }

    pub fn items(&mut self) -> ItemsService<'_, T, S> {
        ItemsService::new(&mut self.executor)
    }

    pub fn catalog(&mut self) -> CatalogService<'_, T, S> {
        CatalogService::new(&mut self.executor, self.config.site)
    }
}
