//! FilterState <-> query string
//!
//! Every field is written on encode so a URL fully reconstructs the search.
//! Decoding is lenient: unknown keys are ignored and anything that does not
//! parse falls back to the field's default.

use url::form_urlencoded;

use super::filter::{FilterState, SortKey, SortOrder, TypeFilter};

pub const SEARCH_PATH: &str = "/search";

pub const KEY_SEARCH_TERM: &str = "searchTerm";
pub const KEY_TYPE: &str = "type";
pub const KEY_PARKING: &str = "parking";
pub const KEY_FURNISHED: &str = "furnished";
pub const KEY_OFFER: &str = "offer";
pub const KEY_SORT: &str = "sort";
pub const KEY_ORDER: &str = "order";
pub const KEY_START_INDEX: &str = "startIndex";

/// Parse a query string (with or without the leading `?`)
pub fn decode(query: &str) -> FilterState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut state = FilterState::default();
    let mut seen: Vec<String> = Vec::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        // First occurrence wins
        if seen.iter().any(|k| *k == key) {
            continue;
        }
        seen.push(key.to_string());

        match &*key {
            KEY_SEARCH_TERM => state.search_term = value.into_owned(),
            KEY_TYPE => state.kind = TypeFilter::parse(&value).unwrap_or_default(),
            KEY_PARKING => state.parking = is_true(&value),
            KEY_FURNISHED => state.furnished = is_true(&value),
            KEY_OFFER => state.offer = is_true(&value),
            KEY_SORT => state.sort_key = SortKey::parse(&value).unwrap_or_default(),
            KEY_ORDER => state.sort_order = SortOrder::parse(&value).unwrap_or_default(),
            KEY_START_INDEX => state.start_index = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    state
}

/// Serialize every field, in a fixed order
pub fn encode(state: &FilterState) -> String {
    let start_index = state.start_index.to_string();
    form_urlencoded::Serializer::new(String::new())
        .append_pair(KEY_SEARCH_TERM, &state.search_term)
        .append_pair(KEY_TYPE, state.kind.as_str())
        .append_pair(KEY_PARKING, bool_str(state.parking))
        .append_pair(KEY_FURNISHED, bool_str(state.furnished))
        .append_pair(KEY_OFFER, bool_str(state.offer))
        .append_pair(KEY_SORT, state.sort_key.as_str())
        .append_pair(KEY_ORDER, state.sort_order.as_str())
        .append_pair(KEY_START_INDEX, &start_index)
        .finish()
}

/// Client-side route for a search
pub fn search_url(state: &FilterState) -> String {
    format!("{}?{}", SEARCH_PATH, encode(state))
}

/// Replace `searchTerm` in an existing query, keeping every other parameter
/// where it was. Used by the quick-search box outside the search view.
pub fn with_search_term(query: &str, term: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut replaced = false;
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == KEY_SEARCH_TERM {
            if !replaced {
                serializer.append_pair(KEY_SEARCH_TERM, term);
                replaced = true;
            }
        } else {
            serializer.append_pair(&key, &value);
        }
    }
    if !replaced {
        serializer.append_pair(KEY_SEARCH_TERM, term);
    }

    serializer.finish()
}

fn is_true(value: &str) -> bool {
    value == "true"
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
