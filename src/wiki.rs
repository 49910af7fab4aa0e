use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::PathBuf;

use log::{debug, info, warn};
use regex::RegexBuilder;

use crate::config::Config;
use crate::errors::WikiError;
use crate::page::Page;
use crate::services::{ContentStore, VersionLedger};
use crate::types::SearchAttr;

/// The wiki index: page enumeration, grouping, search and the move/delete
/// operations that touch both the content store and the version ledger.
pub struct Wiki {
    store: ContentStore,
    ledger: VersionLedger,
}

impl Wiki {
    pub fn new(store: ContentStore, ledger: VersionLedger) -> Self {
        Self { store, ledger }
    }

    /// Build a wiki from configuration, creating the ledger schema as needed
    pub fn open(config: &Config) -> Result<Self, WikiError> {
        let store = ContentStore::new(config.content_dir.clone());
        let ledger = VersionLedger::open(&config.database)?;
        Ok(Self::new(store, ledger))
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Filesystem path backing a page url
    pub fn path(&self, url: &str) -> PathBuf {
        self.store.page_path(url)
    }

    pub fn exists(&self, url: &str) -> bool {
        self.store.exists(url)
    }

    /// Load and render an existing page; `None` when it does not exist
    pub fn get(&self, url: &str) -> Result<Option<Page>, WikiError> {
        if !self.store.exists(url) {
            return Ok(None);
        }
        Page::open(self.store.page_path(url), url).map(Some)
    }

    /// A bare page for a url with no file yet; `None` when one already exists
    pub fn get_bare(&self, url: &str) -> Option<Page> {
        if self.store.exists(url) {
            return None;
        }
        Some(Page::new(self.store.page_path(url), url))
    }

    /// Move a page to a new url, in the content store and the ledger. The
    /// resolved target must stay inside the content root; otherwise nothing
    /// is touched and `PathTraversal` is returned.
    pub fn move_page(&self, url: &str, new_url: &str) -> Result<(), WikiError> {
        let source = self.store.page_path(url);
        let target = self.store.page_path(new_url);
        if !self.store.contains(&target) {
            warn!("Rejected move of '{}' to escaping target '{}'", url, new_url);
            return Err(WikiError::PathTraversal(new_url.to_string()));
        }
        self.store.rename(&source, &target)?;
        self.ledger.rename(url, new_url)?;
        info!("Moved '{}' to '{}'", url, new_url);
        Ok(())
    }

    /// Delete a page file and all its ledger rows. Returns `false` when the
    /// page did not exist.
    pub fn delete(&self, url: &str) -> Result<bool, WikiError> {
        if !self.store.exists(url) {
            return Ok(false);
        }
        self.store.remove(url)?;
        self.ledger.delete(url)?;
        info!("Deleted page '{}'", url);
        Ok(true)
    }

    /// Build the list of all available pages, sorted case-insensitively by
    /// title. This is a full-tree scan on every call.
    pub fn index(&self) -> Result<Vec<Page>, WikiError> {
        let mut pages = Vec::new();
        for (path, url) in self.store.walk()? {
            pages.push(Page::open(path, url)?);
        }
        pages.sort_by_key(|page| page.title().to_lowercase());
        Ok(pages)
    }

    /// Group the index by an arbitrary page-derived key
    pub fn index_by<K, F>(&self, key: F) -> Result<HashMap<K, Vec<Page>>, WikiError>
    where
        K: Eq + Hash,
        F: Fn(&Page) -> K,
    {
        let mut groups: HashMap<K, Vec<Page>> = HashMap::new();
        for page in self.index()? {
            groups.entry(key(&page)).or_default().push(page);
        }
        Ok(groups)
    }

    /// Group pages per tag. Tag strings are comma-separated; whitespace is
    /// trimmed and empty tags skipped.
    pub fn tags(&self) -> Result<BTreeMap<String, Vec<Page>>, WikiError> {
        let mut tags: BTreeMap<String, Vec<Page>> = BTreeMap::new();
        for page in self.index()? {
            for tag in page.tags().split(',') {
                let tag = tag.trim();
                if tag.is_empty() {
                    continue;
                }
                tags.entry(tag.to_string()).or_default().push(page.clone());
            }
        }
        Ok(tags)
    }

    /// Pages whose tag string contains the given tag, title order
    pub fn index_by_tag(&self, tag: &str) -> Result<Vec<Page>, WikiError> {
        let tagged = self
            .index()?
            .into_iter()
            .filter(|page| page.tags().contains(tag))
            .collect();
        Ok(tagged)
    }

    /// Search the index with a regular expression. A page matches when the
    /// pattern is found in any of the requested attributes; results keep
    /// enumeration order. A malformed pattern is an `InvalidPattern` error.
    pub fn search(
        &self,
        term: &str,
        ignore_case: bool,
        attrs: &[SearchAttr],
    ) -> Result<Vec<Page>, WikiError> {
        let regex = RegexBuilder::new(term)
            .case_insensitive(ignore_case)
            .build()?;
        let mut matched = Vec::new();
        for page in self.index()? {
            let hit = attrs.iter().any(|attr| match attr {
                SearchAttr::Title => regex.is_match(page.title()),
                SearchAttr::Tags => regex.is_match(page.tags()),
                SearchAttr::Body => regex.is_match(page.body()),
            });
            if hit {
                matched.push(page);
            }
        }
        debug!("Search '{}' matched {} pages", term, matched.len());
        Ok(matched)
    }

    /// Latest approved revision of a page, rendered
    pub fn latest_approved(&self, url: &str) -> Result<Page, WikiError> {
        let version = self.ledger.max_approved_version(url)?.ok_or_else(|| {
            WikiError::NotFound(format!("no approved version of '{}'", url))
        })?;
        self.version(url, version)
    }

    /// A specific ledger revision of a page, rendered
    pub fn version(&self, url: &str, version: i64) -> Result<Page, WikiError> {
        let content = self.ledger.content_at(url, version)?;
        let mut page = Page::new(self.store.page_path(url), format!("{}/{}", url, version));
        page.load_content(content);
        page.render();
        Ok(page)
    }

    /// Versions of a page still waiting for review
    pub fn pending(&self, url: &str) -> Result<Vec<i64>, WikiError> {
        self.ledger.pending_versions(url)
    }

    /// Approve a pending edit
    pub fn approve(&self, url: &str, version: i64) -> Result<(), WikiError> {
        self.ledger.set_approval(url, version, true)
    }

    /// Reject a pending edit: drop that version from the ledger and put the
    /// last approved content back on disk
    pub fn reject(&self, url: &str, version: i64) -> Result<(), WikiError> {
        self.ledger.delete_version(url, version)?;
        let mut page = self
            .get(url)?
            .ok_or_else(|| WikiError::NotFound(url.to_string()))?;
        page.restore_last_version(&self.ledger)
    }
}
