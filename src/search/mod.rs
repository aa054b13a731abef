pub mod fetcher;
pub mod filter;
pub mod query;
pub mod view;

pub use fetcher::{FetchMode, FetchTicket, ListingFetcher, PAGE_SIZE};
pub use filter::{FilterState, SortKey, SortOrder, TypeFilter};
pub use view::{Applied, SearchError, SearchStatus, SearchView};
