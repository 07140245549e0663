//! MercadoLibre Marketplace Client
//!
//! Client for the MercadoLibre public API with the OAuth2 token lifecycle
//! built in.
//!
//! # Features
//!
//! - Authorization Code grant, with optional PKCE (S256)
//! - Client Credentials and Refresh Token grants
//! - Token persistence to a JSON file with proactive refresh five minutes
//!   before expiry
//! - Request pacing with a minimum interval between calls
//! - Bounded cooldown and retry on HTTP 429
//! - Paginated search aggregation across pages of 50
//! - Item, category and seller lookups
//! - JSON and CSV export of normalized records
//!
//! # Example
//!
//! ```rust,ignore
//! use meli_client::{MeliClient, MeliConfig, SearchFilters, SortOrder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MeliConfig::from_env()?;
//!     let mut client = MeliClient::from_config(config).await?;
//!
//!     client.auth().client_credentials_grant().await?;
//!
//!     let filters = SearchFilters::new().with_sort(SortOrder::PriceAsc);
//!     let outcome = client
//!         .search()
//!         .authenticated(true)
//!         .search_all_detailed("iPhone 15", 120, &filters)
//!         .await?;
//!
//!     println!("{} records ({:?})", outcome.records.len(), outcome.stop_reason);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: wire and domain data structures
//! - `error`: error hierarchy with reason codes and recovery actions
//! - `config`: environment-driven configuration
//! - `core`: HTTP transport abstraction and PKCE generation
//! - `flows`: OAuth2 grant requests against the token endpoint
//! - `token`: token storage and the authenticator state machine
//! - `resilience`: request pacing and the rate-limit retry policy
//! - `client`: the request executor and the [`MeliClient`] facade
//! - `services`: search, items and catalog operations
//! - `export`: JSON/CSV writers
//! - `observability`: logging setup

pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod flows;
pub mod observability;
pub mod resilience;
pub mod services;
pub mod token;
pub mod types;

// Client
pub use client::{ExecutorStats, MeliClient, RequestExecutor};

// Configuration
pub use config::{ClientCredentials, MeliConfig, MeliConfigBuilder};

// Errors
pub use error::{
    ApiError, AuthError, ConfigError, ErrorAction, ExportError, MeliError, MeliResult,
    NetworkError, StorageError,
};

// Transport
pub use crate::core::{HttpTransport, MockHttpTransport, ReqwestHttpTransport};

// Token lifecycle
pub use token::{
    AuthState, AuthStatus, FileTokenStore, InMemoryTokenStore, TokenAuthenticator, TokenStore,
};

// Services
pub use services::{CatalogService, ItemsService, SearchService};

// Resilience
pub use resilience::{RateLimitRetryConfig, RequestPacer};

// Export
pub use export::{ExportFormat, Exporter};

// Logging
pub use observability::{init_logging, LogFormat, LogLevel, LoggingConfig};

// Types
pub use types::{
    Category, CategoryRef, Condition, ItemDetail, NormalizedRecord, PkceChallenge, SearchFilters,
    SearchOutcome, SearchPage, SearchRequest, Seller, SiteId, SortOrder, StopReason, TokenRecord,
    TokenResponse,
};
