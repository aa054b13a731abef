//! Search view state: form, URL sync and the displayed listing collection.
//!
//! Fetching is split in three steps so overlapping requests can be driven
//! from outside: a `begin` step hands out a [`FetchTicket`], the ticket is
//! run against a [`ListingFetcher`], and [`SearchView::apply`] folds the
//! result back in. Only the most recently issued ticket is applied.

use crate::api::ListingQuery;
use crate::error::ApiResult;
use crate::models::Listing;
use crate::router::Navigator;
use crate::search::fetcher::{FetchMode, FetchTicket, ListingFetcher, RequestSequence};
use crate::search::filter::FilterState;
use crate::search::query;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
}

/// Outcome of folding a finished fetch into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Failed,
    /// A newer request was started; the result was dropped
    Stale,
}

/// Failed fetch kept around so it can be retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchError {
    pub message: String,
    pub retryable: bool,
    mode: FetchMode,
    query: ListingQuery,
}

pub struct SearchView<N: Navigator> {
    navigator: N,
    fetcher: ListingFetcher,
    form: FilterState,
    synced_query: Option<String>,
    listings: Vec<Listing>,
    more_available: bool,
    status: SearchStatus,
    error: Option<SearchError>,
    sequence: RequestSequence,
    /// Set once a fetch for the synced query has been applied
    searched: bool,
}

impl<N: Navigator> SearchView<N> {
    pub fn new(navigator: N, fetcher: ListingFetcher) -> Self {
        Self {
            navigator,
            fetcher,
            form: FilterState::default(),
            synced_query: None,
            listings: Vec::new(),
            more_available: false,
            status: SearchStatus::Idle,
            error: None,
            sequence: RequestSequence::default(),
            searched: false,
        }
    }

    pub fn form(&self) -> &FilterState {
        &self.form
    }

    /// Edit the form; nothing is fetched until `submit`
    pub fn form_mut(&mut self) -> &mut FilterState {
        &mut self.form
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn more_available(&self) -> bool {
        self.more_available
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    /// A finished search that matched nothing, as opposed to a failed one
    /// or one that has not run yet
    pub fn is_empty_result(&self) -> bool {
        self.searched && !self.is_loading() && self.error.is_none() && self.listings.is_empty()
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    pub fn fetcher(&self) -> &ListingFetcher {
        &self.fetcher
    }

    /// Write the form to the URL. The new location is picked up by the
    /// next `sync`.
    pub fn submit(&mut self) -> String {
        self.form.start_index = 0;
        let url = query::search_url(&self.form);
        info!("Submitting search: {}", url);
        self.navigator.push(&url);
        url
    }

    /// Follow the navigator's location. Returns a ticket for a new search
    /// when the query string differs from the one last synced.
    pub fn sync(&mut self) -> Option<FetchTicket> {
        let location = self.navigator.location();
        if self.synced_query.as_deref() == Some(location.search.as_str()) {
            return None;
        }

        debug!("Query changed to {:?}", location.search);
        self.form = query::decode(&location.search);
        self.synced_query = Some(location.search);
        self.searched = false;

        let query = self.fetcher.query(&self.form, self.form.start_index);
        Some(self.begin(FetchMode::Replace, query))
    }

    /// Ticket for the next page, if one may be requested now
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.is_loading() || !self.more_available {
            return None;
        }
        let synced = query::decode(self.synced_query.as_deref().unwrap_or(""));
        // The first page of a shared URL may start past zero
        let offset = synced.start_index + self.listings.len();
        let query = self.fetcher.query(&synced, offset);
        Some(self.begin(FetchMode::Append, query))
    }

    /// Re-issue the request that failed last
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.is_loading() {
            return None;
        }
        let failed = self.error.take()?;
        info!("Retrying failed fetch: {}", failed.message);
        Some(self.begin(failed.mode, failed.query))
    }

    fn begin(&mut self, mode: FetchMode, query: ListingQuery) -> FetchTicket {
        let token = self.sequence.next();
        self.status = SearchStatus::Loading;
        self.error = None;
        if mode == FetchMode::Replace {
            self.more_available = false;
        }
        FetchTicket { token, mode, query }
    }

    /// Fold a finished fetch into the view
    pub fn apply(&mut self, ticket: FetchTicket, result: ApiResult<Vec<Listing>>) -> Applied {
        if !self.sequence.is_current(ticket.token) {
            debug!(
                "Dropping stale fetch #{} (latest is #{})",
                ticket.token,
                self.sequence.latest()
            );
            return Applied::Stale;
        }

        self.status = SearchStatus::Idle;

        match result {
            Ok(page) => {
                self.searched = true;
                self.more_available = self.fetcher.has_more(page.len());
                match ticket.mode {
                    FetchMode::Replace => self.listings = page,
                    FetchMode::Append => self.listings.extend(page),
                }
                debug!(
                    "Showing {} listings, more available: {}",
                    self.listings.len(),
                    self.more_available
                );
                Applied::Updated
            }
            Err(e) => {
                warn!("Listing fetch #{} failed: {}", ticket.token, e);
                self.error = Some(SearchError {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                    mode: ticket.mode,
                    query: ticket.query,
                });
                Applied::Failed
            }
        }
    }

    /// Sync with the location and, on change, fetch and apply the new search
    pub async fn refresh(&mut self) -> Option<Applied> {
        let ticket = self.sync()?;
        Some(self.execute(ticket).await)
    }

    /// Fetch and append the next page
    pub async fn show_more(&mut self) -> Option<Applied> {
        let ticket = self.load_more()?;
        Some(self.execute(ticket).await)
    }

    pub async fn retry_fetch(&mut self) -> Option<Applied> {
        let ticket = self.retry()?;
        Some(self.execute(ticket).await)
    }

    async fn execute(&mut self, ticket: FetchTicket) -> Applied {
        let result = self.fetcher.run(&ticket).await;
        self.apply(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{sample_listing, MemoryListings};
    use crate::error::ApiError;
    use crate::models::ListingKind;
    use crate::router::MemoryRouter;
    use crate::search::TypeFilter;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn listings(count: usize) -> Vec<Listing> {
        (0..count)
            .map(|i| {
                let kind = if i % 2 == 0 { ListingKind::Rent } else { ListingKind::Sale };
                sample_listing(&format!("l{:02}", i), &format!("Loft {}", i), kind, 1000 + i as u64)
            })
            .collect()
    }

    fn view_over(count: usize, url: &str) -> (SearchView<MemoryRouter>, Arc<MemoryListings>) {
        let source = Arc::new(MemoryListings::new(listings(count)));
        let fetcher = ListingFetcher::new(source.clone());
        (SearchView::new(MemoryRouter::new(url), fetcher), source)
    }

    #[tokio::test]
    async fn test_mount_fetches_once() {
        let (mut view, source) = view_over(3, "/search");
        assert_eq!(view.refresh().await, Some(Applied::Updated));
        assert_eq!(view.listings().len(), 3);
        assert!(!view.is_loading());

        // Same location: nothing to do
        assert_eq!(view.refresh().await, None);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_full_page_enables_more() {
        let (mut view, _) = view_over(8, "/search");
        view.refresh().await;
        assert!(view.more_available());

        let (mut view, _) = view_over(7, "/search");
        view.refresh().await;
        assert!(!view.more_available());
        assert!(view.load_more().is_none());
    }

    #[tokio::test]
    async fn test_load_more_appends() {
        let (mut view, _) = view_over(12, "/search?sort=regularPrice&order=asc");
        view.refresh().await;
        let first: Vec<String> = view.listings().iter().map(|l| l.id.clone()).collect();
        assert_eq!(first.len(), 8);

        assert_eq!(view.show_more().await, Some(Applied::Updated));
        assert_eq!(view.listings().len(), 12);
        assert_eq!(view.listings()[..8].iter().map(|l| l.id.clone()).collect::<Vec<_>>(), first);
        assert_eq!(view.listings()[8].id, "l08");
        assert!(!view.more_available());
    }

    #[tokio::test]
    async fn test_load_more_continues_from_shared_start_index() {
        let (mut view, _) = view_over(20, "/search?sort=regularPrice&order=asc&startIndex=8");
        view.refresh().await;
        assert_eq!(view.listings()[0].id, "l08");

        let ticket = view.load_more().unwrap();
        assert_eq!(ticket.query.offset(), 16);
        let result = view.fetcher().run(&ticket).await;
        view.apply(ticket, result);

        let ids: Vec<&str> = view.listings().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(ids.first(), Some(&"l08"));
        assert_eq!(ids.last(), Some(&"l19"));
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(!view.more_available());
    }

    #[tokio::test]
    async fn test_load_more_uses_synced_query_not_form_edits() {
        let (mut view, _) = view_over(10, "/search?type=all");
        view.refresh().await;
        view.form_mut().kind = TypeFilter::Sale;

        let ticket = view.load_more().unwrap();
        assert_eq!(ticket.mode, FetchMode::Append);
        assert_eq!(ticket.query.filter.kind, TypeFilter::All);
        assert_eq!(ticket.query.offset(), 8);
    }

    #[tokio::test]
    async fn test_submit_replaces_collection() {
        let (mut view, _) = view_over(12, "/search");
        view.refresh().await;
        view.show_more().await;
        assert_eq!(view.listings().len(), 12);

        view.form_mut().kind = TypeFilter::Rent;
        view.form_mut().start_index = 40;
        let url = view.submit();
        assert!(url.contains("type=rent"));
        assert!(url.contains("startIndex=0"));

        assert_eq!(view.refresh().await, Some(Applied::Updated));
        assert_eq!(view.listings().len(), 6);
        assert!(view.listings().iter().all(|l| l.kind == ListingKind::Rent));
    }

    #[tokio::test]
    async fn test_url_is_authoritative_after_navigation() {
        let (mut view, _) = view_over(4, "/search?type=sale");
        view.refresh().await;
        assert_eq!(view.form().kind, TypeFilter::Sale);

        view.form_mut().kind = TypeFilter::Rent;
        view.submit();
        view.refresh().await;

        view.navigator_mut().back();
        assert_eq!(view.refresh().await, Some(Applied::Updated));
        assert_eq!(view.form().kind, TypeFilter::Sale);
        assert!(view.listings().iter().all(|l| l.kind == ListingKind::Sale));
    }

    #[tokio::test]
    async fn test_failure_keeps_collection_and_retries() {
        let (mut view, source) = view_over(5, "/search");
        view.refresh().await;
        assert_eq!(view.listings().len(), 5);

        source.fail_next(1);
        view.form_mut().kind = TypeFilter::Rent;
        view.submit();
        assert_eq!(view.refresh().await, Some(Applied::Failed));
        assert_eq!(view.listings().len(), 5);
        assert!(!view.is_loading());
        assert!(!view.is_empty_result());
        let error = view.error().unwrap();
        assert!(error.retryable);
        assert!(error.message.contains("500"));

        assert_eq!(view.retry_fetch().await, Some(Applied::Updated));
        assert!(view.error().is_none());
        assert_eq!(view.listings().len(), 3);
        assert!(view.retry().is_none());
    }

    #[tokio::test]
    async fn test_not_empty_before_first_fetch() {
        let (mut view, _) = view_over(0, "/search");
        assert!(!view.is_empty_result());

        let ticket = view.sync().unwrap();
        assert!(!view.is_empty_result());
        view.apply(ticket, Ok(Vec::new()));
        assert!(view.is_empty_result());

        view.navigator_mut().push("/search?type=sale");
        view.sync().unwrap();
        assert!(!view.is_empty_result());
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let (mut view, _) = view_over(5, "/search?searchTerm=castle");
        view.refresh().await;
        assert!(view.is_empty_result());
        assert!(view.error().is_none());
    }

    #[test]
    fn test_later_ticket_wins_regardless_of_completion_order() {
        let (mut view, _) = view_over(0, "/search?type=rent");
        let a = view.sync().unwrap();
        view.navigator_mut().push("/search?type=sale");
        let b = view.sync().unwrap();
        assert!(b.token > a.token);

        let b_page = listings(2);
        let a_page = listings(5);
        assert_eq!(view.apply(b, Ok(b_page.clone())), Applied::Updated);
        assert_eq!(view.apply(a, Ok(a_page)), Applied::Stale);
        assert_eq!(view.listings(), b_page.as_slice());
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let (mut view, _) = view_over(0, "/search?type=rent");
        let a = view.sync().unwrap();
        view.navigator_mut().push("/search?type=sale");
        let b = view.sync().unwrap();

        let err = ApiError::Server {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(view.apply(a, Err(err)), Applied::Stale);
        assert!(view.error().is_none());
        assert!(view.is_loading());

        assert_eq!(view.apply(b, Ok(listings(1))), Applied::Updated);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_no_load_more_while_loading() {
        let (mut view, _) = view_over(0, "/search");
        let ticket = view.sync().unwrap();
        assert!(view.load_more().is_none());
        view.apply(ticket, Ok(listings(8)));
        assert!(view.load_more().is_some());
    }
}
