//! Service modules for the marketplace API.

pub mod catalog;
pub mod items;
pub mod search;

pub use catalog::CatalogService;
pub use items::ItemsService;
pub use search::SearchService;

use crate::error::ApiError;

/// Ids are interpolated into the path, so only plain tokens are accepted.
pub(crate) fn validate_id(kind: &str, id: &str) -> Result<(), ApiError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest {
            message: format!("invalid {} '{}'", kind, id),
        })
    }
}
