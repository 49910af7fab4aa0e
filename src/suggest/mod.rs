use log::debug;

use crate::errors::WikiError;
use crate::page::Page;
use crate::services::HistoryStore;
use crate::types::{HistoryItem, SuggestionItem};
use crate::utils::format_timestamp;

/// Common capability of the dropdown searchers: turn a query into an ordered
/// list of titles ready for the rendering boundary
pub trait DropdownSearch {
    fn render(&self, query: &str) -> Result<Vec<String>, WikiError>;
}

/// Case-insensitive title-substring matching over the page index. Stateless;
/// results keep index order, which is already title-sorted.
pub struct SuggestionSearch<'a> {
    pages: &'a [Page],
}

impl<'a> SuggestionSearch<'a> {
    pub fn new(pages: &'a [Page]) -> Self {
        Self { pages }
    }

    pub fn search(&self, query: &str) -> Vec<SuggestionItem> {
        let needle = query.to_lowercase();
        self.pages
            .iter()
            .filter(|page| page.title().to_lowercase().contains(&needle))
            .map(|page| SuggestionItem {
                title: page.title().to_string(),
            })
            .collect()
    }
}

impl DropdownSearch for SuggestionSearch<'_> {
    fn render(&self, query: &str) -> Result<Vec<String>, WikiError> {
        Ok(self
            .search(query)
            .into_iter()
            .map(|item| item.title)
            .collect())
    }
}

/// Recency-ranked matches from one user's access history. Entries whose page
/// no longer exists in the index are silently dropped.
pub struct HistorySearch<'a> {
    pages: &'a [Page],
    store: &'a HistoryStore,
    user: String,
}

impl<'a> HistorySearch<'a> {
    pub fn new(pages: &'a [Page], store: &'a HistoryStore, user: impl Into<String>) -> Self {
        Self {
            pages,
            store,
            user: user.into(),
        }
    }

    pub fn search(&self, query: &str) -> Result<Vec<HistoryItem>, WikiError> {
        let needle = query.to_lowercase();
        let mut items = Vec::new();
        // entries come back most recently accessed first
        for entry in self.store.entries_for(&self.user)? {
            if !entry.url.to_lowercase().contains(&needle) {
                continue;
            }
            let entry_key = entry.url.to_lowercase();
            let Some(page) = self
                .pages
                .iter()
                .find(|page| page.title().to_lowercase() == entry_key)
            else {
                continue;
            };
            items.push(HistoryItem {
                title: page.title().to_string(),
                date: format_timestamp(entry.last_accessed),
            });
        }
        Ok(items)
    }
}

impl DropdownSearch for HistorySearch<'_> {
    fn render(&self, query: &str) -> Result<Vec<String>, WikiError> {
        Ok(self
            .search(query)?
            .into_iter()
            .map(|item| item.title)
            .collect())
    }
}

/// Autocomplete response for the rendering boundary. `history` is present
/// only when a history store was configured.
#[derive(Debug, Clone, PartialEq)]
pub struct DropdownResponse {
    pub suggestions: Vec<String>,
    pub history: Option<Vec<String>>,
}

/// Dropdown autocomplete over the page index, optionally personalized with
/// the current user's access history
pub struct Dropdown<'a> {
    suggestions: SuggestionSearch<'a>,
    history: Option<HistorySearch<'a>>,
}

impl<'a> Dropdown<'a> {
    pub fn new(pages: &'a [Page]) -> Self {
        Self {
            suggestions: SuggestionSearch::new(pages),
            history: None,
        }
    }

    pub fn with_history(
        pages: &'a [Page],
        store: &'a HistoryStore,
        user: impl Into<String>,
    ) -> Self {
        Self {
            suggestions: SuggestionSearch::new(pages),
            history: Some(HistorySearch::new(pages, store, user)),
        }
    }

    pub fn render(&self, query: &str) -> Result<DropdownResponse, WikiError> {
        let suggestions = self.suggestions.render(query)?;
        let history = match &self.history {
            Some(history) => Some(history.render(query)?),
            None => None,
        };
        debug!(
            "Autocomplete for '{}': {} suggestions, history: {}",
            query,
            suggestions.len(),
            history.is_some()
        );
        Ok(DropdownResponse {
            suggestions,
            history,
        })
    }
}
