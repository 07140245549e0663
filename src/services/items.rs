//! Item detail operations.

use serde::Deserialize;

use crate::client::RequestExecutor;
use crate::core::HttpTransport;
use crate::error::ApiError;
use crate::services::validate_id;
use crate::token::TokenStore;
use crate::types::{ItemDetail, RawItem};

#[derive(Debug, Default, Deserialize)]
struct RawDescription {
    #[serde(default)]
    plain_text: String,
    #[serde(default)]
    text: String,
}

/// Service for `/items` operations.
pub struct ItemsService<'a, T: HttpTransport, S: TokenStore> {
    executor: &'a mut RequestExecutor<T, S>,
    authenticated: bool,
}

impl<'a, T: HttpTransport, S: TokenStore> ItemsService<'a, T, S> {
    pub fn new(executor: &'a mut RequestExecutor<T, S>) -> Self {
        Self {
            executor,
            authenticated: false,
        }
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Gets one listing with its attributes and pictures.
    pub async fn get(&mut self, item_id: &str) -> Result<ItemDetail, ApiError> {
        validate_id("item id", item_id)?;
        let raw: RawItem = self
            .executor
            .get(&format!("/items/{}", item_id), &[], self.authenticated)
            .await?;
        Ok(ItemDetail::from(raw))
    }

    /// Gets the seller-written description as plain text.
    pub async fn description(&mut self, item_id: &str) -> Result<String, ApiError> {
        validate_id("item id", item_id)?;
        let raw: RawDescription = self
            .executor
            .get(
                &format!("/items/{}/description", item_id),
                &[],
                self.authenticated,
            )
            .await?;

        Ok(if raw.plain_text.is_empty() {
            raw.text
        } else {
            raw.plain_text
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::executor;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_item() {
        let (mut exec, transport) = executor().await;
        transport.queue_json(
            200,
            json!({
                "id": "MLM123",
                "title": "Samsung Galaxy S23",
                "price": 12999.5,
                "currency_id": "MXN",
                "seller_id": 42,
                "shipping": {"free_shipping": true},
                "attributes": [{"id": "BRAND", "name": "Marca", "value_name": "Samsung"}]
            }),
        );

        let item = ItemsService::new(&mut exec).get("MLM123").await.unwrap();
        assert_eq!(item.record.title, "Samsung Galaxy S23");
        assert_eq!(item.record.seller_id, 42);
        assert!(item.record.free_shipping);
        assert_eq!(item.attributes.len(), 1);
        assert!(transport.last_request().unwrap().url.ends_with("/items/MLM123"));
    }

    #[tokio::test]
    async fn test_description_falls_back_to_text() {
        let (mut exec, transport) = executor().await;
        transport.queue_json(200, json!({"text": "Nuevo, sellado", "plain_text": ""}));

        let text = ItemsService::new(&mut exec).description("MLM123").await.unwrap();
        assert_eq!(text, "Nuevo, sellado");
    }

    #[tokio::test]
    async fn test_missing_item_is_http_error() {
        let (mut exec, transport) = executor().await;
        transport.queue_json(404, json!({"message": "Item with id MLM0 not found"}));

        let err = ItemsService::new(&mut exec).get("MLM0").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_rejects_path_injection() {
        let (mut exec, transport) = executor().await;
        let err = ItemsService::new(&mut exec).get("../users/me").await.unwrap_err();
        assert_eq!(err.reason(), "invalid_request");
        assert_eq!(transport.request_count(), 0);
    }
}
