/// Ordered front-matter mapping. Keys are lowercased; insertion order is
/// preserved so pages round-trip through save unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    entries: Vec<(String, String)>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, replacing an existing value in place
    pub fn insert(&mut self, key: &str, value: &str) {
        let key = key.to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key, value.to_string())),
        }
    }

    /// Join a continuation line onto the most recent value
    pub fn extend_last(&mut self, line: &str) {
        if let Some(entry) = self.entries.last_mut() {
            entry.1.push('\n');
            entry.1.push_str(line);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One row of the version ledger
#[derive(Debug, Clone, PartialEq)]
pub struct PageVersion {
    pub url: String,
    pub version: i64,
    pub content: String,
    pub created_at: i64,
    pub author: String,
    pub approved: bool,
}

/// One row of the per-user access history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub user: String,
    pub last_accessed: i64,
    pub access_count: i64,
}

/// Autocomplete projection of an indexed page
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionItem {
    pub title: String,
}

/// Autocomplete projection of a previously visited page
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub title: String,
    /// RFC 3339 rendering of the last access time
    pub date: String,
}

/// Page attributes the index search can match against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAttr {
    Title,
    Tags,
    Body,
}

/// Default attribute set for `Wiki::search`
pub const DEFAULT_SEARCH_ATTRS: [SearchAttr; 3] =
    [SearchAttr::Title, SearchAttr::Tags, SearchAttr::Body];
