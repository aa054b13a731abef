use crate::api::{ListingQuery, ListingSource};
use crate::error::ApiResult;
use crate::models::Listing;
use crate::search::filter::FilterState;
use std::sync::Arc;
use tracing::debug;

/// Listings requested per page
pub const PAGE_SIZE: usize = 8;

/// What a finished fetch does to the displayed collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// New search: the page becomes the collection
    Replace,
    /// Load more: the page is added to the end
    Append,
}

/// A started fetch. Only the ticket with the latest token may update the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub mode: FetchMode,
    pub query: ListingQuery,
}

/// Monotonic request counter
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }
}

/// Issues paged reads against the listing collection
#[derive(Clone)]
pub struct ListingFetcher {
    source: Arc<dyn ListingSource>,
    page_size: usize,
}

impl ListingFetcher {
    pub fn new(source: Arc<dyn ListingSource>) -> Self {
        Self::with_page_size(source, PAGE_SIZE)
    }

    pub fn with_page_size(source: Arc<dyn ListingSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Backend query for `filter`, starting at `offset`
    pub fn query(&self, filter: &FilterState, offset: usize) -> ListingQuery {
        ListingQuery::new(filter.at_offset(offset), self.page_size)
    }

    /// A full page means there may be more behind it
    pub fn has_more(&self, returned: usize) -> bool {
        returned >= self.page_size
    }

    pub async fn fetch(&self, filter: &FilterState, offset: usize) -> ApiResult<Vec<Listing>> {
        self.fetch_query(&self.query(filter, offset)).await
    }

    /// Run the request a ticket describes
    pub async fn run(&self, ticket: &FetchTicket) -> ApiResult<Vec<Listing>> {
        debug!(
            "Running fetch #{} ({:?}) at offset {} against {}",
            ticket.token,
            ticket.mode,
            ticket.query.offset(),
            self.source.source_name()
        );
        self.fetch_query(&ticket.query).await
    }

    async fn fetch_query(&self, query: &ListingQuery) -> ApiResult<Vec<Listing>> {
        self.source.listings(query).await
    }
}
