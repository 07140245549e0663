//! Listing records.
//!
//! Raw upstream shapes are deserialized leniently and folded into
//! [`NormalizedRecord`], whose numeric fields default to zero and flags to
//! `false` instead of being null.

use serde::{Deserialize, Serialize};

/// Currency assumed when a listing does not report one.
pub const DEFAULT_CURRENCY: &str = "MXN";

/// Stable record shape returned by search and used for export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub permalink: String,
    pub thumbnail: String,
    pub condition: String,
    pub listing_type_id: String,
    pub seller_id: u64,
    pub category_id: String,
    /// Not every listing reports stock.
    pub available_quantity: Option<u64>,
    pub sold_quantity: u64,
    pub free_shipping: bool,
    pub official_store_id: Option<u64>,
}

/// Listing as returned by search results and `/items/{id}`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub listing_type_id: Option<String>,
    #[serde(default)]
    pub seller: Option<RawSeller>,
    /// `/items/{id}` carries the seller id flat.
    #[serde(default)]
    pub seller_id: Option<u64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub available_quantity: Option<u64>,
    #[serde(default)]
    pub sold_quantity: Option<u64>,
    #[serde(default)]
    pub shipping: Option<RawShipping>,
    #[serde(default)]
    pub official_store_id: Option<u64>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub pictures: Vec<RawPicture>,
    #[serde(default)]
    pub warranty: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSeller {
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawShipping {
    #[serde(default)]
    pub free_shipping: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawAttribute {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPicture {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
}

impl From<&RawItem> for NormalizedRecord {
    fn from(raw: &RawItem) -> Self {
        let seller_id = raw
            .seller
            .as_ref()
            .and_then(|s| s.id)
            .or(raw.seller_id)
            .unwrap_or(0);

        Self {
            id: raw.id.clone(),
            title: raw.title.clone(),
            price: raw.price.unwrap_or(0.0),
            currency: raw
                .currency_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            permalink: raw.permalink.clone().unwrap_or_default(),
            thumbnail: raw.thumbnail.clone().unwrap_or_default(),
            condition: raw.condition.clone().unwrap_or_default(),
            listing_type_id: raw.listing_type_id.clone().unwrap_or_default(),
            seller_id,
            category_id: raw.category_id.clone().unwrap_or_default(),
            available_quantity: raw.available_quantity,
            sold_quantity: raw.sold_quantity.unwrap_or(0),
            free_shipping: raw
                .shipping
                .as_ref()
                .and_then(|s| s.free_shipping)
                .unwrap_or(false),
            official_store_id: raw.official_store_id,
        }
    }
}

impl NormalizedRecord {
    /// Normalizes one raw JSON entry. `None` when the entry is not an object
    /// or one of its fields has an unexpected type.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        RawItem::deserialize(value)
            .ok()
            .map(|raw| Self::from(&raw))
    }
}

/// Named attribute of a listing ("Marca", "Modelo", ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ItemAttribute {
    pub id: String,
    pub name: String,
    pub value: Option<String>,
}

/// Full listing detail from `/items/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemDetail {
    pub record: NormalizedRecord,
    pub attributes: Vec<ItemAttribute>,
    pub pictures: Vec<String>,
    pub warranty: Option<String>,
}

impl From<RawItem> for ItemDetail {
    fn from(raw: RawItem) -> Self {
        let record = NormalizedRecord::from(&raw);
        let attributes = raw
            .attributes
            .into_iter()
            .map(|a| ItemAttribute {
                id: a.id.unwrap_or_default(),
                name: a.name.unwrap_or_default(),
                value: a.value_name,
            })
            .collect();
        let pictures = raw
            .pictures
            .into_iter()
            .filter_map(|p| p.secure_url.or(p.url))
            .collect();

        Self {
            record,
            attributes,
            pictures,
            warranty: raw.warranty,
        }
    }
}
