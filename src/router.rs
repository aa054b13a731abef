//! Navigation context handed to views instead of a global location

use tracing::debug;

/// Current client-side location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    /// Query string without the leading `?`
    pub search: String,
}

impl Location {
    pub fn parse(url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        Self {
            pathname: if path.is_empty() { "/".to_string() } else { path.to_string() },
            search: query.to_string(),
        }
    }

    pub fn href(&self) -> String {
        if self.search.is_empty() {
            self.pathname.clone()
        } else {
            format!("{}?{}", self.pathname, self.search)
        }
    }
}

pub trait Navigator: Send {
    fn location(&self) -> Location;

    /// Navigate to `url`, adding a history entry
    fn push(&mut self, url: &str);
}

/// History stack kept in memory
#[derive(Debug, Clone)]
pub struct MemoryRouter {
    entries: Vec<Location>,
    index: usize,
}

impl MemoryRouter {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![Location::parse(initial)],
            index: 0,
        }
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        debug!("Back to {}", self.entries[self.index].href());
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        debug!("Forward to {}", self.entries[self.index].href());
        true
    }

    pub fn history_len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryRouter {
    fn location(&self) -> Location {
        self.entries[self.index].clone()
    }

    fn push(&mut self, url: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(Location::parse(url));
        self.index = self.entries.len() - 1;
        debug!("Navigated to {}", url);
    }
}
