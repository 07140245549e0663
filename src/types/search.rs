//! Search request and page types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::types::NormalizedRecord;

/// Largest page the search endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Item condition filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Used,
    NotSpecified,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
            Self::NotSpecified => "not_specified",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "used" => Ok(Self::Used),
            "not_specified" => Ok(Self::NotSpecified),
            other => Err(format!(
                "unknown condition '{}' (expected new, used or not_specified)",
                other
            )),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Relevance,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            other => Err(format!(
                "unknown sort '{}' (expected relevance, price_asc or price_desc)",
                other
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional search filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub condition: Option<Condition>,
    pub sort: Option<SortOrder>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// One search call: non-empty query, limit in `1..=50`, any offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    limit: u32,
    offset: u32,
    filters: SearchFilters,
}

impl SearchRequest {
    pub fn new(
        query: impl Into<String>,
        limit: u32,
        offset: u32,
        filters: SearchFilters,
    ) -> Result<Self, ApiError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ApiError::InvalidRequest {
                message: "search query must not be empty".to_string(),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::InvalidRequest {
                message: format!("limit must be between 1 and {}, got {}", MAX_PAGE_SIZE, limit),
            });
        }

        Ok(Self {
            query,
            limit,
            offset,
            filters,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// Query string parameters for the search endpoint.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.query.clone()),
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if let Some(category) = &self.filters.category {
            params.push(("category".to_string(), category.clone()));
        }
        if let Some(condition) = self.filters.condition {
            params.push(("condition".to_string(), condition.as_str().to_string()));
        }
        if let Some(sort) = self.filters.sort {
            params.push(("sort".to_string(), sort.as_str().to_string()));
        }
        params
    }
}

/// `paging` object of a search response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Paging {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Raw search response body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub paging: Paging,
}

/// One normalized page of results.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPage {
    pub records: Vec<NormalizedRecord>,
    /// Total reported by the provider for the whole query.
    pub total: u64,
    /// Number of raw entries on the page, including any that failed to
    /// normalize.
    pub raw_count: usize,
}

/// Why an aggregated search stopped.
#[derive(Debug)]
pub enum StopReason {
    /// `max_results` records were collected.
    TargetReached,
    /// The provider returned an empty page.
    EmptyPage,
    /// `offset + page_size` reached the reported total.
    Exhausted,
    /// A page request failed; the records collected so far were kept.
    Failed(ApiError),
}

/// Aggregated search result with the information needed to judge
/// completeness.
#[derive(Debug)]
pub struct SearchOutcome {
    pub records: Vec<NormalizedRecord>,
    pub pages_fetched: u32,
    pub reported_total: Option<u64>,
    pub stop_reason: StopReason,
}

impl SearchOutcome {
    /// False when a page request failed and the list may be short.
    pub fn is_complete(&self) -> bool {
        !matches!(self.stop_reason, StopReason::Failed(_))
    }
}
