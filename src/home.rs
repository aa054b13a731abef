use crate::api::{ListingQuery, ListingSource};
use crate::models::Listing;
use crate::search::{FilterState, TypeFilter};
use tracing::{info, warn};

/// Listings shown per home page section
pub const SECTION_SIZE: usize = 4;

/// Newest offers, rentals and sales for the landing page
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub offers: Vec<Listing>,
    pub rentals: Vec<Listing>,
    pub sales: Vec<Listing>,
}

impl HomeFeed {
    /// Load all three sections concurrently. A failing section is logged
    /// and left empty.
    pub async fn load(source: &dyn ListingSource) -> Self {
        let offers = section(
            source,
            "offers",
            FilterState {
                offer: true,
                ..Default::default()
            },
        );
        let rentals = section(
            source,
            "rentals",
            FilterState {
                kind: TypeFilter::Rent,
                ..Default::default()
            },
        );
        let sales = section(
            source,
            "sales",
            FilterState {
                kind: TypeFilter::Sale,
                ..Default::default()
            },
        );

        let (offers, rentals, sales) = futures::join!(offers, rentals, sales);
        info!(
            "Home feed: {} offers, {} rentals, {} sales",
            offers.len(),
            rentals.len(),
            sales.len()
        );
        Self {
            offers,
            rentals,
            sales,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty() && self.rentals.is_empty() && self.sales.is_empty()
    }
}

async fn section(source: &dyn ListingSource, name: &str, filter: FilterState) -> Vec<Listing> {
    match source.listings(&ListingQuery::new(filter, SECTION_SIZE)).await {
        Ok(listings) => listings,
        Err(e) => {
            warn!("Failed to load {} section: {}", name, e);
            Vec::new()
        }
    }
}
