pub mod draft;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use draft::ListingDraft;

/// Cover shown for listings that were saved without images
pub const PLACEHOLDER_IMAGE: &str = "https://53.fs1.hubspotusercontent-na1.net/hub/53/hubfs/Sales_Blog/real-estate-business-compressor.jpg?width=595&height=400&name=real-estate-business-compressor.jpg";

/// Whether a listing is offered for rent or for sale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Rent,
    Sale,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Rent => "rent",
            ListingKind::Sale => "sale",
        }
    }
}

/// Core listing data model, as served by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub regular_price: u64,
    #[serde(default)]
    pub discount_price: u64,
    pub bathrooms: u32,
    pub bedrooms: u32,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    #[serde(default)]
    pub offer: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub user_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Price the listing is actually offered at
    pub fn effective_price(&self) -> u64 {
        if self.offer {
            self.discount_price
        } else {
            self.regular_price
        }
    }

    /// "$1,250 / month" for rentals, "$450,000" for sales
    pub fn price_label(&self) -> String {
        let mut label = format!("${}", group_thousands(self.effective_price()));
        if self.kind == ListingKind::Rent {
            label.push_str(" / month");
        }
        label
    }

    pub fn bedrooms_label(&self) -> String {
        plural(self.bedrooms, "bed")
    }

    pub fn bathrooms_label(&self) -> String {
        plural(self.bathrooms, "bath")
    }

    pub fn cover_image(&self) -> &str {
        self.image_urls
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count > 1 {
        format!("{} {}s", count, noun)
    } else {
        format!("{} {}", count, noun)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Marketplace user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Listing {
        serde_json::from_value(json!({
            "_id": "65a1",
            "name": "Sunny loft",
            "description": "Top floor",
            "address": "12 Main St",
            "regularPrice": 1250,
            "discountPrice": 1100,
            "bathrooms": 1,
            "bedrooms": 2,
            "furnished": true,
            "parking": false,
            "type": "rent",
            "offer": false,
            "imageUrls": [],
            "userRef": "u1",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_listing_decodes_backend_shape() {
        let listing = sample();
        assert_eq!(listing.id, "65a1");
        assert_eq!(listing.kind, ListingKind::Rent);
        assert!(listing.created_at.is_some());
        assert!(listing.updated_at.is_none());
    }

    #[test]
    fn test_price_label_uses_discount_on_offer() {
        let mut listing = sample();
        assert_eq!(listing.price_label(), "$1,250 / month");

        listing.offer = true;
        listing.kind = ListingKind::Sale;
        listing.discount_price = 1_450_000;
        assert_eq!(listing.price_label(), "$1,450,000");
    }

    #[test]
    fn test_room_labels() {
        let listing = sample();
        assert_eq!(listing.bedrooms_label(), "2 beds");
        assert_eq!(listing.bathrooms_label(), "1 bath");
    }

    #[test]
    fn test_cover_falls_back_to_placeholder() {
        let mut listing = sample();
        assert_eq!(listing.cover_image(), PLACEHOLDER_IMAGE);
        listing.image_urls.push("https://img/1.png".to_string());
        assert_eq!(listing.cover_image(), "https://img/1.png");
    }
}
