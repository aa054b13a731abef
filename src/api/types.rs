use serde::{Deserialize, Serialize};

use crate::search::{query, FilterState};

/// Parameters of a listing collection read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Search criteria; `start_index` is the page offset
    pub filter: FilterState,
    /// Page size requested from the backend
    pub limit: usize,
}

impl ListingQuery {
    pub fn new(filter: FilterState, limit: usize) -> Self {
        Self { filter, limit }
    }

    pub fn offset(&self) -> usize {
        self.filter.start_index
    }

    /// Query string sent to `/api/listing/get`
    pub fn to_query_string(&self) -> String {
        format!("{}&limit={}", query::encode(&self.filter), self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Profile changes; only the fields that are set are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.avatar.is_none()
    }
}

/// Error body the backend sends, sometimes with a 2xx status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub success: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::TypeFilter;

    #[test]
    fn test_query_string_carries_offset_and_limit() {
        let filter = FilterState {
            kind: TypeFilter::Sale,
            start_index: 16,
            ..Default::default()
        };
        let q = ListingQuery::new(filter, 8).to_query_string();
        assert!(q.contains("type=sale"));
        assert!(q.contains("startIndex=16"));
        assert!(q.ends_with("&limit=8"));
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            avatar: Some("https://img/me.png".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"avatar":"https://img/me.png"}"#
        );
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());
    }
}
