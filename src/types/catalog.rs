//! Category and seller types.

use serde::{Deserialize, Serialize};

/// Category reference as listed under a site or in a category path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// `/categories/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_items_in_this_category: Option<u64>,
    #[serde(default)]
    pub path_from_root: Vec<CategoryRef>,
    #[serde(default)]
    pub children_categories: Vec<CategoryRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerReputation {
    #[serde(default)]
    pub level_id: Option<String>,
    #[serde(default)]
    pub power_seller_status: Option<String>,
}

/// `/users/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: u64,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub seller_reputation: SellerReputation,
}
