use crate::api::traits::ListingSource;
use crate::api::types::{FailureBody, ListingQuery, SignInRequest, SignUpRequest, UserUpdate};
use crate::error::{ApiError, ApiResult};
use crate::models::draft::ListingPayload;
use crate::models::{Listing, ListingDraft, User};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::ParseError;
use tracing::{debug, info, warn};

/// Cookie the backend uses to carry the session
pub const TOKEN_COOKIE: &str = "access_token";

/// Result of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: Option<String>,
}

/// REST client for the marketplace backend
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpApi {
    /// Create a client for the backend at `base_url` with a 30s timeout
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("estate-search/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()?;

        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Attach a stored session token to every request
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL with `segments` appended to its path, each escaped on its
    /// own. A path prefix on the base is kept.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::Validation(format!("Invalid id {:?}", bad)));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        Ok(self.request_url(method, self.endpoint(segments)?))
    }

    fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header(COOKIE, format!("{}={}", TOKEN_COOKIE, token)),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;
        parse_body(status, &body)
    }

    /// Fetch a single listing
    pub async fn listing(&self, id: &str) -> ApiResult<Listing> {
        let response = self
            .request(Method::GET, &["api", "listing", "get", id])?
            .send()
            .await?;
        Self::read(response).await
    }

    /// Validate and submit a new listing owned by `owner`
    pub async fn create_listing(&self, draft: &ListingDraft, owner: &User) -> ApiResult<Listing> {
        draft.validate()?;
        let response = self
            .request(Method::POST, &["api", "listing", "create"])?
            .json(&ListingPayload {
                draft,
                user_ref: &owner.id,
            })
            .send()
            .await?;
        let listing: Listing = Self::read(response).await?;
        info!("Created listing {}", listing.id);
        Ok(listing)
    }

    pub async fn update_listing(
        &self,
        id: &str,
        draft: &ListingDraft,
        owner: &User,
    ) -> ApiResult<Listing> {
        draft.validate()?;
        let response = self
            .request(Method::POST, &["api", "listing", "update", id])?
            .json(&ListingPayload {
                draft,
                user_ref: &owner.id,
            })
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn delete_listing(&self, id: &str) -> ApiResult<()> {
        let response = self
            .request(Method::DELETE, &["api", "listing", "delete", id])?
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response).await?;
        info!("Deleted listing {}", id);
        Ok(())
    }

    /// Listings owned by a user
    pub async fn user_listings(&self, user_id: &str) -> ApiResult<Vec<Listing>> {
        let response = self
            .request(Method::GET, &["api", "user", "listings", user_id])?
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> ApiResult<User> {
        let response = self
            .request(Method::POST, &["api", "user", "update", id])?
            .json(update)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let response = self
            .request(Method::DELETE, &["api", "user", "delete", id])?
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response).await?;
        Ok(())
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<()> {
        let response = self
            .request(Method::POST, &["api", "auth", "signup"])?
            .json(request)
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response).await?;
        info!("Registered {}", request.email);
        Ok(())
    }

    /// Sign in and capture the session cookie so it can be persisted
    pub async fn sign_in(&self, request: &SignInRequest) -> ApiResult<SignedIn> {
        let response = self
            .request(Method::POST, &["api", "auth", "signin"])?
            .json(request)
            .send()
            .await?;

        let token = response
            .cookies()
            .find(|c| c.name() == TOKEN_COOKIE)
            .map(|c| c.value().to_string());
        if token.is_none() {
            debug!("Sign-in response carried no {} cookie", TOKEN_COOKIE);
        }

        let user: User = Self::read(response).await?;
        info!("Signed in as {}", user.username);
        Ok(SignedIn { user, token })
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        let response = self.request(Method::GET, &["api", "auth", "signout"])?.send().await?;
        let _: serde_json::Value = Self::read(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ListingSource for HttpApi {
    async fn listings(&self, query: &ListingQuery) -> ApiResult<Vec<Listing>> {
        let mut url = self.endpoint(&["api", "listing", "get"])?;
        // Already form-encoded
        url.set_query(Some(&query.to_query_string()));

        let response = self.request_url(Method::GET, url).send().await?;
        let listings: Vec<Listing> = Self::read(response).await?;
        debug!("Received {} listings at offset {}", listings.len(), query.offset());
        Ok(listings)
    }

    async fn user(&self, id: &str) -> ApiResult<User> {
        let response = self
            .request(Method::GET, &["api", "user", id])?
            .send()
            .await?;
        Self::read(response).await
    }

    fn source_name(&self) -> &'static str {
        "marketplace"
    }
}

/// Turn a response body into `T`, mapping both non-2xx statuses and
/// `{"success": false}` bodies to `ApiError::Server`
fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    let failure = serde_json::from_str::<FailureBody>(body).ok();

    if !status.is_success() {
        let message = failure
            .map(|f| f.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        warn!("Backend returned status {}: {}", status, message);
        return Err(ApiError::Server {
            status: status.as_u16(),
            message,
        });
    }

    if let Some(failure) = failure.filter(|f| !f.success) {
        warn!("Backend reported failure: {}", failure.message);
        return Err(ApiError::Server {
            status: failure.status_code.unwrap_or(status.as_u16()),
            message: failure.message,
        });
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_listing_page() {
        let body = r#"[{"_id":"a","name":"Loft","address":"1 Main","regularPrice":900,
            "bathrooms":1,"bedrooms":1,"type":"rent"}]"#;
        let listings: Vec<Listing> = parse_body(StatusCode::OK, body).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Loft");
    }

    #[test]
    fn test_error_status_carries_server_message() {
        let body = r#"{"success":false,"statusCode":404,"message":"Listing not found!"}"#;
        let err = parse_body::<Listing>(StatusCode::NOT_FOUND, body).unwrap_err();
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Listing not found!");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_status_without_body() {
        let err = parse_body::<Vec<Listing>>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert_eq!(err.to_string(), "Server returned 502: Bad Gateway");
    }

    #[test]
    fn test_success_false_with_ok_status() {
        let body = r#"{"success":false,"statusCode":401,"message":"Unauthorized"}"#;
        let err = parse_body::<User>(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 401, .. }));
    }

    #[test]
    fn test_unexpected_body_is_decode_error() {
        let err = parse_body::<Vec<Listing>>(StatusCode::OK, r#"{"items":[]}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        assert!(matches!(HttpApi::new("not a url"), Err(ApiError::Url(_))));
        let api = HttpApi::new("http://localhost:3000").unwrap();
        assert_eq!(api.base_url().as_str(), "http://localhost:3000/");
        assert!(api.token().is_none());
        assert!(matches!(HttpApi::new("mailto:me@example.com"), Err(ApiError::Url(_))));
    }

    #[test]
    fn test_endpoint_escapes_ids() {
        let api = HttpApi::new("http://localhost:3000").unwrap();
        let url = api.endpoint(&["api", "listing", "get", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/listing/get/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = api.endpoint(&["api", "user", "../listing/create"]).unwrap();
        assert_eq!(url.path(), "/api/user/..%2Flisting%2Fcreate");

        assert!(matches!(
            api.endpoint(&["api", "user", ".."]),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            api.endpoint(&["api", "user", ""]),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        for base in ["https://host/backend/", "https://host/backend"] {
            let api = HttpApi::new(base).unwrap();
            let url = api.endpoint(&["api", "listing", "get"]).unwrap();
            assert_eq!(url.as_str(), "https://host/backend/api/listing/get");
        }
    }
}
