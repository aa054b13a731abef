use crate::api::ListingSource;
use crate::error::ApiResult;
use crate::models::{Listing, User};
use url::form_urlencoded::byte_serialize;

/// Owner of a listing
pub async fn landlord(source: &dyn ListingSource, listing: &Listing) -> ApiResult<User> {
    source.user(&listing.user_ref).await
}

/// `mailto:` link for a message to the landlord about `listing`
pub fn mailto(landlord: &User, listing: &Listing, message: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        landlord.email,
        encode(&format!("Regarding {}", listing.name)),
        encode(message)
    )
}

// Mail clients do not treat `+` as a space
fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
