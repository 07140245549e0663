//! Categories and sellers.

use crate::client::RequestExecutor;
use crate::core::HttpTransport;
use crate::error::ApiError;
use crate::services::validate_id;
use crate::token::TokenStore;
use crate::types::{Category, CategoryRef, Seller, SiteId};

/// Service for category and user lookups.
pub struct CatalogService<'a, T: HttpTransport, S: TokenStore> {
    executor: &'a mut RequestExecutor<T, S>,
    site: SiteId,
}

impl<'a, T: HttpTransport, S: TokenStore> CatalogService<'a, T, S> {
    pub fn new(executor: &'a mut RequestExecutor<T, S>, site: SiteId) -> Self {
        Self { executor, site }
    }

    /// Top-level categories of the site.
    pub async fn categories(&mut self) -> Result<Vec<CategoryRef>, ApiError> {
        self.executor
            .get(&format!("/sites/{}/categories", self.site), &[], false)
            .await
    }

    pub async fn category(&mut self, category_id: &str) -> Result<Category, ApiError> {
        validate_id("category id", category_id)?;
        self.executor
            .get(&format!("/categories/{}", category_id), &[], false)
            .await
    }

    pub async fn seller(&mut self, seller_id: u64) -> Result<Seller, ApiError> {
        self.executor
            .get(&format!("/users/{}", seller_id), &[], false)
            .await
    }
}
