//! Search Aggregator
//!
//! Single pages and multi-page aggregation over the site search endpoint.
//!
//! Aggregation is best effort: a failing page ends the walk and the records
//! collected so far are returned. Callers that need to know whether the list
//! is complete should use [`SearchService::search_all_detailed`].

use crate::client::RequestExecutor;
use crate::core::HttpTransport;
use crate::error::ApiError;
use crate::token::TokenStore;
use crate::types::{
    NormalizedRecord, RawSearchResponse, SearchFilters, SearchOutcome, SearchPage, SearchRequest,
    SiteId, StopReason, MAX_PAGE_SIZE,
};

/// Service for search operations.
pub struct SearchService<'a, T: HttpTransport, S: TokenStore> {
    executor: &'a mut RequestExecutor<T, S>,
    site: SiteId,
    authenticated: bool,
}

impl<'a, T: HttpTransport, S: TokenStore> SearchService<'a, T, S> {
    pub fn new(executor: &'a mut RequestExecutor<T, S>, site: SiteId) -> Self {
        Self {
            executor,
            site,
            authenticated: false,
        }
    }

    /// Send the bearer token with every page request.
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    fn endpoint(&self) -> String {
        format!("/sites/{}/search", self.site)
    }

    /// Fetches one page.
    pub async fn search_page(
        &mut self,
        query: &str,
        limit: u32,
        offset: u32,
        filters: &SearchFilters,
    ) -> Result<SearchPage, ApiError> {
        let request = SearchRequest::new(query, limit, offset, filters.clone())?;
        self.fetch(&request).await
    }

    async fn fetch(&mut self, request: &SearchRequest) -> Result<SearchPage, ApiError> {
        let endpoint = self.endpoint();
        let raw: RawSearchResponse = self
            .executor
            .get(&endpoint, &request.to_params(), self.authenticated)
            .await?;

        let raw_count = raw.results.len();
        let records: Vec<NormalizedRecord> = raw
            .results
            .iter()
            .filter_map(|entry| {
                let record = NormalizedRecord::from_value(entry);
                if record.is_none() {
                    tracing::warn!(offset = request.offset(), "Skipping malformed search entry");
                }
                record
            })
            .collect();

        tracing::debug!(
            query = request.query(),
            offset = request.offset(),
            count = raw_count,
            total = raw.paging.total,
            "Search page fetched"
        );

        Ok(SearchPage {
            records,
            total: raw.paging.total,
            raw_count,
        })
    }

    /// Up to `max_results` records, walking pages of 50. Page failures end
    /// the walk without an error; only an invalid query is rejected.
    pub async fn search_all(
        &mut self,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<NormalizedRecord>, ApiError> {
        Ok(self
            .search_all_detailed(query, max_results, filters)
            .await?
            .records)
    }

    /// [`search_all`](Self::search_all) with the reason the walk stopped.
    pub async fn search_all_detailed(
        &mut self,
        query: &str,
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<SearchOutcome, ApiError> {
        // validates the query once, before any request
        SearchRequest::new(query, MAX_PAGE_SIZE, 0, filters.clone())?;

        let page_size = MAX_PAGE_SIZE;
        let mut offset: u32 = 0;
        let mut collected: Vec<NormalizedRecord> = Vec::new();
        let mut pages_fetched = 0u32;
        let mut reported_total = None;
        let mut stop_reason = StopReason::TargetReached;

        while collected.len() < max_results {
            let request = SearchRequest::new(query, page_size, offset, filters.clone())?;

            let page = match self.fetch(&request).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        query,
                        offset,
                        collected = collected.len(),
                        reason = e.reason(),
                        error = %e,
                        "Search page failed, returning partial results"
                    );
                    stop_reason = StopReason::Failed(e);
                    break;
                }
            };
            pages_fetched += 1;
            reported_total = Some(page.total);

            if page.raw_count == 0 {
                stop_reason = StopReason::EmptyPage;
                break;
            }

            collected.extend(page.records);

            if u64::from(offset) + u64::from(page_size) >= page.total {
                stop_reason = StopReason::Exhausted;
                break;
            }
            offset = match offset.checked_add(page_size) {
                Some(next) => next,
                None => {
                    stop_reason = StopReason::Exhausted;
                    break;
                }
            };
        }

        if collected.len() >= max_results {
            collected.truncate(max_results);
            stop_reason = StopReason::TargetReached;
        }

        tracing::info!(
            query,
            records = collected.len(),
            pages = pages_fetched,
            "Search finished"
        );

        Ok(SearchOutcome {
            records: collected,
            pages_fetched,
            reported_total,
            stop_reason,
        })
    }
}
