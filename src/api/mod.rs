pub mod client;
pub mod memory;
pub mod traits;
pub mod types;

pub use client::{HttpApi, SignedIn};
pub use memory::MemoryListings;
pub use traits::ListingSource;
pub use types::{ListingQuery, SignInRequest, SignUpRequest, UserUpdate};
