//! Configuration module for the MercadoLibre client.
//!
//! Credentials, endpoints, file locations, pacing and rate-limit policy.
//! Built with [`MeliConfigBuilder`] or loaded with [`MeliConfig::from_env`].

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{AuthError, ConfigError};
use crate::resilience::RateLimitRetryConfig;
use crate::types::SiteId;

/// Default base URL for the public API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mercadolibre.com";

/// Default base URL for the user authorization page.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.mercadolibre.com.mx";

/// Default redirect URI registered for the application.
pub const DEFAULT_REDIRECT_URI: &str = "https://httpbin.org/get";

/// Default token file.
pub const DEFAULT_TOKEN_PATH: &str = ".meli_token.json";

/// Default PKCE file.
pub const DEFAULT_PKCE_PATH: &str = ".pkce_data.json";

/// Default export directory.
pub const DEFAULT_EXPORTS_DIR: &str = "exports";

/// Default minimum spacing between requests.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default window before expiry in which a token is refreshed.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Application credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for the client.
#[derive(Clone)]
pub struct MeliConfig {
    pub(crate) client_id: Option<String>,
    pub(crate) client_secret: Option<SecretString>,
    /// Site every catalog call is scoped to.
    pub site: SiteId,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub redirect_uri: String,
    pub token_path: PathBuf,
    pub pkce_path: PathBuf,
    pub exports_dir: PathBuf,
    /// Minimum spacing between consecutive requests.
    pub min_request_interval: Duration,
    pub timeout: Duration,
    pub refresh_buffer: Duration,
    pub rate_limit: RateLimitRetryConfig,
}

impl MeliConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MeliConfigBuilder {
        MeliConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MELI_CLIENT_ID`, `MELI_CLIENT_SECRET`: application credentials
    /// - `DEFAULT_SITE`: site id such as `MLA` or `MLM`
    /// - `DELAY_BETWEEN_REQUESTS`: seconds between requests (float)
    /// - `MELI_API_BASE_URL`, `MELI_AUTH_URL`, `MELI_REDIRECT_URI`
    /// - `MELI_TOKEN_PATH`, `MELI_PKCE_PATH`, `EXPORTS_DIR`
    /// - `MELI_TIMEOUT`: request timeout in seconds
    /// - `MELI_RATE_LIMIT_MAX_RETRIES`: retries after a 429
    ///
    /// Unparseable optional values are ignored in favour of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = MeliConfigBuilder::new();

        if let Some(id) = get("MELI_CLIENT_ID") {
            builder = builder.client_id(id);
        }
        if let Some(secret) = get("MELI_CLIENT_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(site) = get("DEFAULT_SITE") {
            let site = site
                .parse::<SiteId>()
                .map_err(|message| ConfigError::InvalidValue {
                    field: "DEFAULT_SITE".to_string(),
                    message,
                })?;
            builder = builder.site(site);
        }
        if let Some(url) = get("MELI_API_BASE_URL") {
            builder = builder.api_base_url(url);
        }
        if let Some(url) = get("MELI_AUTH_URL") {
            builder = builder.auth_base_url(url);
        }
        if let Some(uri) = get("MELI_REDIRECT_URI") {
            builder = builder.redirect_uri(uri);
        }
        if let Some(path) = get("MELI_TOKEN_PATH") {
            builder = builder.token_path(path);
        }
        if let Some(path) = get("MELI_PKCE_PATH") {
            builder = builder.pkce_path(path);
        }
        if let Some(dir) = get("EXPORTS_DIR") {
            builder = builder.exports_dir(dir);
        }
        if let Some(delay) = get("DELAY_BETWEEN_REQUESTS").and_then(|v| v.parse::<f64>().ok()) {
            if let Ok(interval) = Duration::try_from_secs_f64(delay) {
                builder = builder.min_request_interval(interval);
            }
        }
        if let Some(secs) = get("MELI_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = get("MELI_RATE_LIMIT_MAX_RETRIES").and_then(|v| v.parse::<u32>().ok())
        {
            let mut policy = RateLimitRetryConfig::default();
            policy.max_retries = retries;
            builder = builder.rate_limit(policy);
        }

        builder.build()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Credentials required by every grant.
    pub fn credentials(&self) -> Result<ClientCredentials, AuthError> {
        let client_id = self
            .client_id
            .clone()
            .ok_or(AuthError::MissingCredentials {
                field: "MELI_CLIENT_ID",
            })?;
        let secret = self
            .client_secret
            .as_ref()
            .ok_or(AuthError::MissingCredentials {
                field: "MELI_CLIENT_SECRET",
            })?;
        Ok(ClientCredentials::new(client_id, secret.expose_secret().clone()))
    }

    /// `{api_base_url}/oauth/token`
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", self.api_base_url.trim_end_matches('/'))
    }

    /// `{auth_base_url}/authorization`
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/authorization", self.auth_base_url.trim_end_matches('/'))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("auth_base_url", &self.auth_base_url),
            ("redirect_uri", &self.redirect_uri),
        ] {
            Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                message: e.to_string(),
            })?;
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.rate_limit.initial_cooldown.is_zero() && self.rate_limit.max_retries > 0 {
            return Err(ConfigError::InvalidValue {
                field: "rate_limit.initial_cooldown".to_string(),
                message: "must be greater than zero when retries are enabled".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for MeliConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            site: SiteId::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            pkce_path: PathBuf::from(DEFAULT_PKCE_PATH),
            exports_dir: PathBuf::from(DEFAULT_EXPORTS_DIR),
            min_request_interval: DEFAULT_MIN_REQUEST_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            rate_limit: RateLimitRetryConfig::default(),
        }
    }
}

impl fmt::Debug for MeliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeliConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("site", &self.site)
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("token_path", &self.token_path)
            .field("pkce_path", &self.pkce_path)
            .field("exports_dir", &self.exports_dir)
            .field("min_request_interval", &self.min_request_interval)
            .field("timeout", &self.timeout)
            .field("refresh_buffer", &self.refresh_buffer)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

/// Builder for [`MeliConfig`].
#[derive(Default)]
pub struct MeliConfigBuilder {
    config: MeliConfig,
}

impl MeliConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.config.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    pub fn site(mut self, site: SiteId) -> Self {
        self.config.site = site;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth_base_url = url.into();
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.redirect_uri = uri.into();
        self
    }

    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_path = path.into();
        self
    }

    pub fn pkce_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pkce_path = path.into();
        self
    }

    pub fn exports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.exports_dir = dir.into();
        self
    }

    pub fn min_request_interval(mut self, interval: Duration) -> Self {
        self.config.min_request_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn refresh_buffer(mut self, buffer: Duration) -> Self {
        self.config.refresh_buffer = buffer;
        self
    }

    pub fn rate_limit(mut self, policy: RateLimitRetryConfig) -> Self {
        self.config.rate_limit = policy;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<MeliConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MeliConfig::builder().build().unwrap();
        assert_eq!(config.site, SiteId::Mlm);
        assert_eq!(config.token_endpoint(), "https://api.mercadolibre.com/oauth/token");
        assert_eq!(
            config.authorization_endpoint(),
            "https://auth.mercadolibre.com.mx/authorization"
        );
        assert_eq!(config.min_request_interval, Duration::from_secs(1));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = MeliConfig::from_lookup(lookup(&[
            ("MELI_CLIENT_ID", "abc"),
            ("MELI_CLIENT_SECRET", "def"),
            ("DEFAULT_SITE", "mla"),
            ("DELAY_BETWEEN_REQUESTS", "0.25"),
            ("MELI_RATE_LIMIT_MAX_RETRIES", "5"),
        ]))
        .unwrap();

        assert_eq!(config.client_id(), Some("abc"));
        assert_eq!(config.site, SiteId::Mla);
        assert_eq!(config.min_request_interval, Duration::from_millis(250));
        assert_eq!(config.rate_limit.max_retries, 5);

        let creds = config.credentials().unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(creds.secret(), "def");
    }

    #[test]
    fn test_unparseable_optional_values_fall_back() {
        let config = MeliConfig::from_lookup(lookup(&[
            ("DELAY_BETWEEN_REQUESTS", "soon"),
            ("MELI_TIMEOUT", "-3"),
        ]))
        .unwrap();
        assert_eq!(config.min_request_interval, DEFAULT_MIN_REQUEST_INTERVAL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_out_of_range_delay_falls_back() {
        for delay in ["1e300", "-1", "NaN", "inf"] {
            let config =
                MeliConfig::from_lookup(lookup(&[("DELAY_BETWEEN_REQUESTS", delay)])).unwrap();
            assert_eq!(
                config.min_request_interval, DEFAULT_MIN_REQUEST_INTERVAL,
                "delay {}",
                delay
            );
        }
    }

    #[test]
    fn test_unknown_site_is_rejected() {
        let err = MeliConfig::from_lookup(lookup(&[("DEFAULT_SITE", "XXX")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "DEFAULT_SITE"));
    }

    #[test]
    fn test_missing_credentials_surface_on_use() {
        let config = MeliConfig::builder().client_id("abc").build().unwrap();
        let err = config.credentials().unwrap_err();
        assert_eq!(err.reason(), "missing_credentials");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = MeliConfig::builder().api_base_url("not a url").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = MeliConfig::builder()
            .client_id("abc")
            .client_secret("super-secret")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
