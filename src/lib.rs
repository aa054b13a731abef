pub mod api;
pub mod config;
pub mod contact;
pub mod error;
pub mod home;
pub mod models;
pub mod router;
pub mod search;
pub mod session;
pub mod upload;

pub use api::{HttpApi, ListingSource, MemoryListings};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use models::{Listing, ListingDraft, ListingKind, User};
pub use router::{Location, MemoryRouter, Navigator};
pub use search::{FilterState, ListingFetcher, SearchView};
