//! Types
//!
//! Data structures shared across the client.

pub mod catalog;
pub mod pkce;
pub mod record;
pub mod search;
pub mod site;
pub mod token;

pub use catalog::{Category, CategoryRef, Seller, SellerReputation};
pub use pkce::{PkceChallenge, CODE_CHALLENGE_METHOD};
pub use record::{ItemAttribute, ItemDetail, NormalizedRecord, RawItem, DEFAULT_CURRENCY};
pub use search::{
    Condition, Paging, RawSearchResponse, SearchFilters, SearchOutcome, SearchPage,
    SearchRequest, SortOrder, StopReason, MAX_PAGE_SIZE,
};
pub use site::SiteId;
pub use token::{TokenRecord, TokenResponse};
