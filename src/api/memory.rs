use crate::api::traits::ListingSource;
use crate::api::types::ListingQuery;
use crate::error::{ApiError, ApiResult};
use crate::models::{Listing, ListingKind, User};
use crate::search::{SortKey, SortOrder, TypeFilter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// In-memory listing backend applying the same filter rules as the server:
/// unchecked amenity flags and `type=all` match everything, the search term
/// is a case-insensitive substring of the name.
#[derive(Default)]
pub struct MemoryListings {
    listings: Vec<Listing>,
    users: Vec<User>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryListings {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            ..Default::default()
        }
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    /// Make the next `count` listing reads fail with a 500
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of listing reads served or failed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn matches(listing: &Listing, query: &ListingQuery) -> bool {
        let filter = &query.filter;
        let term = filter.search_term.to_lowercase();

        let kind_ok = match filter.kind {
            TypeFilter::All => true,
            TypeFilter::Rent => listing.kind == ListingKind::Rent,
            TypeFilter::Sale => listing.kind == ListingKind::Sale,
        };

        kind_ok
            && (!filter.offer || listing.offer)
            && (!filter.parking || listing.parking)
            && (!filter.furnished || listing.furnished)
            && listing.name.to_lowercase().contains(&term)
    }
}

#[async_trait]
impl ListingSource for MemoryListings {
    async fn listings(&self, query: &ListingQuery) -> ApiResult<Vec<Listing>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::Server {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        let mut found: Vec<&Listing> = self
            .listings
            .iter()
            .filter(|l| Self::matches(l, query))
            .collect();

        match query.filter.sort_key {
            SortKey::CreatedAt => found.sort_by_key(|l| l.created_at),
            SortKey::RegularPrice => found.sort_by_key(|l| l.regular_price),
        }
        if query.filter.sort_order == SortOrder::Desc {
            found.reverse();
        }

        let page: Vec<Listing> = found
            .into_iter()
            .skip(query.offset())
            .take(query.limit)
            .cloned()
            .collect();

        debug!("Memory source served {} listings", page.len());
        Ok(page)
    }

    async fn user(&self, id: &str) -> ApiResult<User> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: "User not found!".to_string(),
            })
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

/// Listing fixture with sensible defaults
pub fn sample_listing(id: &str, name: &str, kind: ListingKind, price: u64) -> Listing {
    Listing {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} in a quiet street", name),
        address: format!("{} Main St", price % 100),
        regular_price: price,
        discount_price: price * 9 / 10,
        bathrooms: 1,
        bedrooms: 2,
        furnished: false,
        parking: false,
        kind,
        offer: false,
        image_urls: Vec::new(),
        user_ref: "owner".to_string(),
        created_at: None,
        updated_at: None,
    }
}
