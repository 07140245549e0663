//! Request Executor
//!
//! Every outbound API call goes through [`RequestExecutor::request`] (GET) or
//! [`RequestExecutor::post`] (form POST):
//!
//! 1. wait for the pacer (minimum spacing since the previous call)
//! 2. attach the bearer token when the call needs authentication
//! 3. on 429, cool down and retry, up to the configured number of retries
//! 4. on 401, refresh once and retry once; a second 401 or a failed refresh
//!    is `auth_failed`. The refresh is paced like any other call
//! 5. any other non-2xx status is returned as `http_error` without retrying
//!
//! Network failures are returned as `network_error` and never retried here.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::MeliConfig;
use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::ApiError;
use crate::resilience::{RateLimitRetryConfig, RateLimitStats, RequestPacer};
use crate::token::{TokenAuthenticator, TokenStore};
use crate::types::TokenRecord;

/// Executor counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// HTTP calls actually sent, retries included.
    pub http_calls: u32,
    pub auth_refreshes: u32,
    pub rate_limit: RateLimitStats,
}

/// Paced, retrying request executor.
pub struct RequestExecutor<T: HttpTransport, S: TokenStore> {
    transport: Arc<T>,
    authenticator: TokenAuthenticator<T, S>,
    pacer: RequestPacer,
    rate_limit: RateLimitRetryConfig,
    base_url: String,
    timeout: Duration,
    stats: ExecutorStats,
}

impl<T: HttpTransport, S: TokenStore> RequestExecutor<T, S> {
    pub fn new(
        config: &MeliConfig,
        transport: Arc<T>,
        authenticator: TokenAuthenticator<T, S>,
    ) -> Self {
        Self {
            transport,
            authenticator,
            pacer: RequestPacer::new(config.min_request_interval),
            rate_limit: config.rate_limit.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            stats: ExecutorStats::default(),
        }
    }

    pub fn authenticator(&self) -> &TokenAuthenticator<T, S> {
        &self.authenticator
    }

    pub fn authenticator_mut(&mut self) -> &mut TokenAuthenticator<T, S> {
        &mut self.authenticator
    }

    pub fn stats(&self) -> &ExecutorStats {
        &self.stats
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }

    /// GET `endpoint` and return the JSON body.
    pub async fn request(
        &mut self,
        endpoint: &str,
        params: &[(String, String)],
        auth_required: bool,
    ) -> Result<serde_json::Value, ApiError> {
        self.execute(HttpMethod::Get, endpoint, params, auth_required)
            .await
    }

    /// POST `fields` form-encoded to `endpoint` and return the JSON body.
    pub async fn post(
        &mut self,
        endpoint: &str,
        fields: &[(String, String)],
        auth_required: bool,
    ) -> Result<serde_json::Value, ApiError> {
        self.execute(HttpMethod::Post, endpoint, fields, auth_required)
            .await
    }

    async fn execute(
        &mut self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(String, String)],
        auth_required: bool,
    ) -> Result<serde_json::Value, ApiError> {
        let (url, form) = match method {
            HttpMethod::Get => (self.build_url(endpoint, params)?, None),
            HttpMethod::Post => (self.build_url(endpoint, &[])?, Some(params)),
        };

        let mut token = if auth_required {
            Some(self.authenticator.current_token().await?)
        } else {
            None
        };
        let mut refreshed = false;
        let mut throttle_retries = 0u32;

        loop {
            let response = self.send_paced(&url, form, token.as_ref()).await?;

            match response.status {
                200..=299 => return decode_body(&response),
                429 => {
                    self.stats.rate_limit.throttled_responses += 1;
                    if !self.rate_limit.allows_retry(throttle_retries) {
                        self.stats.rate_limit.exhausted += 1;
                        tracing::error!(
                            endpoint,
                            attempts = throttle_retries + 1,
                            "Rate limit retries exhausted"
                        );
                        return Err(ApiError::RateLimitExhausted {
                            attempts: throttle_retries + 1,
                        });
                    }

                    let cooldown = self.cooldown(throttle_retries, &response);
                    tracing::warn!(
                        endpoint,
                        retry = throttle_retries + 1,
                        delay_ms = cooldown.as_millis() as u64,
                        "Rate limited, cooling down"
                    );
                    tokio::time::sleep(cooldown).await;
                    throttle_retries += 1;
                    self.stats.rate_limit.retries += 1;
                }
                401 if auth_required => {
                    if refreshed {
                        tracing::warn!(endpoint, "Still unauthorized after token refresh");
                        return Err(ApiError::AuthFailed {
                            message: "request unauthorized after token refresh".to_string(),
                        });
                    }

                    tracing::info!(endpoint, "Unauthorized, refreshing token");
                    // the token endpoint shares the spacing with API calls
                    self.pacer.wait().await;
                    let refresh = self.authenticator.refresh().await;
                    self.pacer.mark();
                    match refresh {
                        Ok(fresh) => {
                            self.stats.auth_refreshes += 1;
                            token = Some(fresh);
                            refreshed = true;
                        }
                        Err(e) => {
                            return Err(ApiError::AuthFailed {
                                message: format!("token refresh failed: {}", e),
                            });
                        }
                    }
                }
                status => {
                    tracing::debug!(endpoint, status, "Request failed");
                    return Err(ApiError::Http {
                        status,
                        body: response.body,
                    });
                }
            }
        }
    }

    /// [`request`](Self::request) decoded into `D`.
    pub async fn get<D: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        params: &[(String, String)],
        auth_required: bool,
    ) -> Result<D, ApiError> {
        let value = self.request(endpoint, params, auth_required).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode {
            message: format!("{}: {}", endpoint, e),
        })
    }

    async fn send_paced(
        &mut self,
        url: &str,
        form: Option<&[(String, String)]>,
        token: Option<&TokenRecord>,
    ) -> Result<HttpResponse, ApiError> {
        self.pacer.wait().await;

        let request = match form {
            Some(fields) => {
                let fields: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                HttpRequest::post_form(url, &fields)
            }
            None => HttpRequest::get(url),
        };
        let mut request = request
            .with_header("accept", "application/json")
            .with_timeout(self.timeout);
        if let Some(token) = token {
            request = request.with_header("authorization", token.authorization_header());
        }

        tracing::debug!(
            url,
            method = ?request.method,
            authenticated = token.is_some(),
            "Sending request"
        );
        self.stats.http_calls += 1;
        let result = self.transport.send(request).await;

        // the cursor moves on every outcome, failures included
        self.pacer.mark();

        let response = result.map_err(|cause| {
            tracing::warn!(url, error = %cause, "Network failure");
            ApiError::Network { cause }
        })?;
        tracing::debug!(url, status = response.status, "Received response");
        Ok(response)
    }

    /// Policy cooldown, stretched to honour a longer `Retry-After` up to the
    /// policy cap.
    fn cooldown(&self, retry: u32, response: &HttpResponse) -> Duration {
        let base = self.rate_limit.cooldown_for(retry);
        let retry_after = response
            .headers
            .get("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        match retry_after {
            Some(hint) if hint > base => hint.min(self.rate_limit.max_cooldown.max(base)),
            _ => base,
        }
    }

    fn build_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<String, ApiError> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut url = url::Url::parse(&raw).map_err(|e| ApiError::InvalidRequest {
            message: format!("invalid URL {}: {}", raw, e),
        })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }
}

fn decode_body(response: &HttpResponse) -> Result<serde_json::Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}
