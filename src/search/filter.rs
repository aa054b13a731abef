use serde::{Deserialize, Serialize};

/// Listing type selection in the search form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Rent,
    Sale,
}

impl TypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Rent => "rent",
            TypeFilter::Sale => "sale",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(TypeFilter::All),
            "rent" => Some(TypeFilter::Rent),
            "sale" => Some(TypeFilter::Sale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "regularPrice")]
    RegularPrice,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::RegularPrice => "regularPrice",
        }
    }

    /// Older links spell the creation key `created_at`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" | "created_at" => Some(SortKey::CreatedAt),
            "regularPrice" => Some(SortKey::RegularPrice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Current search criteria of a search view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub search_term: String,
    #[serde(rename = "type")]
    pub kind: TypeFilter,
    pub parking: bool,
    pub furnished: bool,
    pub offer: bool,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// Pagination offset
    pub start_index: usize,
}

impl FilterState {
    /// Apply one of the combined sort options offered in the form,
    /// e.g. `regularPrice_desc`. Unknown options leave the sort untouched.
    pub fn set_sort_option(&mut self, option: &str) -> bool {
        let Some((key, order)) = option.rsplit_once('_') else {
            return false;
        };
        match (SortKey::parse(key), SortOrder::parse(order)) {
            (Some(key), Some(order)) => {
                self.sort_key = key;
                self.sort_order = order;
                true
            }
            _ => false,
        }
    }

    pub fn sort_option(&self) -> String {
        format!("{}_{}", self.sort_key.as_str(), self.sort_order.as_str())
    }

    /// Same criteria, different page
    pub fn at_offset(&self, start_index: usize) -> Self {
        Self {
            start_index,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = FilterState::default();
        assert_eq!(state.search_term, "");
        assert_eq!(state.kind, TypeFilter::All);
        assert!(!state.parking && !state.furnished && !state.offer);
        assert_eq!(state.sort_key, SortKey::CreatedAt);
        assert_eq!(state.sort_order, SortOrder::Desc);
        assert_eq!(state.start_index, 0);
    }

    #[test]
    fn test_sort_option() {
        let mut state = FilterState::default();
        assert_eq!(state.sort_option(), "createdAt_desc");

        assert!(state.set_sort_option("regularPrice_asc"));
        assert_eq!(state.sort_key, SortKey::RegularPrice);
        assert_eq!(state.sort_order, SortOrder::Asc);

        assert!(state.set_sort_option("created_at_desc"));
        assert_eq!(state.sort_key, SortKey::CreatedAt);

        assert!(!state.set_sort_option("bedrooms_up"));
        assert_eq!(state.sort_option(), "createdAt_desc");
    }
}
