use crate::api::types::ListingQuery;
use crate::error::ApiResult;
use crate::models::{Listing, User};
use async_trait::async_trait;

/// Read side of the listing backend.
/// The search flow and the home feed only need this, so tests can swap in
/// an in-memory source.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page of the listing collection
    async fn listings(&self, query: &ListingQuery) -> ApiResult<Vec<Listing>>;

    /// Look up a user, e.g. the owner of a listing
    async fn user(&self, id: &str) -> ApiResult<User>;

    /// Get the name of the backend
    fn source_name(&self) -> &'static str;
}
