use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::ListingKind;

/// Images a single listing may carry
pub const MAX_IMAGES: usize = 6;

/// Listing form contents for create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub regular_price: u64,
    pub discount_price: u64,
    pub offer: bool,
    pub parking: bool,
    pub furnished: bool,
    pub image_urls: Vec<String>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            kind: ListingKind::Rent,
            bedrooms: 1,
            bathrooms: 1,
            regular_price: 50,
            discount_price: 0,
            offer: false,
            parking: false,
            furnished: false,
            image_urls: Vec::new(),
        }
    }
}

/// Body sent to the backend: the draft plus its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListingPayload<'a> {
    #[serde(flatten)]
    pub draft: &'a ListingDraft,
    pub user_ref: &'a str,
}

impl ListingDraft {
    /// Check the form rules that must hold before submitting
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.image_urls.is_empty() {
            return Err(ApiError::Validation(
                "You must upload at least one image".to_string(),
            ));
        }
        if self.image_urls.len() > MAX_IMAGES {
            return Err(ApiError::Validation(format!(
                "You can only upload {} images per listing",
                MAX_IMAGES
            )));
        }
        if self.offer && self.regular_price < self.discount_price {
            return Err(ApiError::Validation(
                "Discount price must be lower than regular price".to_string(),
            ));
        }
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.image_urls.len() {
            self.image_urls.remove(index);
        }
    }
}
