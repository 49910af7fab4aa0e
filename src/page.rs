use std::path::{Path, PathBuf};

use log::debug;

use crate::errors::WikiError;
use crate::render::Processor;
use crate::services::VersionLedger;
use crate::services::content_service::{read_page, write_page};
use crate::types::Meta;

/// An in-memory wiki page bound to a content-store path and a logical url.
///
/// A Page is a short-lived view, materialized per request from the working
/// copy on disk or from a ledger row; it is never persisted itself. The
/// storage handles it needs are passed into each operation explicitly.
#[derive(Debug, Clone)]
pub struct Page {
    path: PathBuf,
    url: String,
    content: String,
    meta: Meta,
    html: String,
    body: String,
}

impl Page {
    /// Bare page that does not exist on disk yet
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            content: String::new(),
            meta: Meta::new(),
            html: String::new(),
            body: String::new(),
        }
    }

    /// Load and render an existing page
    pub fn open(path: impl Into<PathBuf>, url: impl Into<String>) -> Result<Self, WikiError> {
        let mut page = Self::new(path, url);
        page.load()?;
        page.render();
        Ok(page)
    }

    /// Read the working copy from the content store. The filesystem is the
    /// authoritative live copy; the ledger is history.
    pub fn load(&mut self) -> Result<(), WikiError> {
        self.content = read_page(&self.path)?;
        Ok(())
    }

    /// Replace the working content in memory, for ledger-sourced views
    pub fn load_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Run the render pipeline over the working content
    pub fn render(&mut self) {
        let (html, body, meta) = Processor::new(&self.content).process();
        self.html = html;
        self.body = body;
        self.meta = meta;
    }

    fn write_out(&self) -> Result<(), WikiError> {
        let mut text = String::new();
        for (key, value) in self.meta.iter() {
            text.push_str(key);
            text.push_str(": ");
            text.push_str(value);
            text.push('\n');
        }
        text.push('\n');
        text.push_str(&self.body.replace("\r\n", "\n"));
        write_page(&self.path, &text)
    }

    /// Write front matter and body back to the content store. With `persist`
    /// the saved file is reloaded from disk and appended to the version
    /// ledger as authored by `author`; `update` marks the save as an edit of
    /// an existing page rather than its first version.
    pub fn save(
        &mut self,
        ledger: &VersionLedger,
        author: &str,
        update: bool,
        persist: bool,
    ) -> Result<(), WikiError> {
        self.write_out()?;
        if persist {
            self.load()?;
            let version = ledger.append(&self.url, &self.content, author)?;
            debug!(
                "Saved '{}' as version {} ({})",
                self.url,
                version,
                if update { "edit" } else { "initial" }
            );
        }
        self.render();
        Ok(())
    }

    /// Every version before the current one, content pulled from the ledger.
    /// Each carries the synthetic sub-url `"<url>/<version>"`, for display
    /// only.
    pub fn previous_versions(&self, ledger: &VersionLedger) -> Result<Vec<Page>, WikiError> {
        let count = ledger.version_count(&self.url)?;
        let mut pages = Vec::new();
        for version in 1..count {
            pages.push(self.version_view(ledger, version)?);
        }
        Ok(pages)
    }

    /// Version numbers still waiting for the author's review
    pub fn pending_edits(&self, ledger: &VersionLedger) -> Result<Vec<i64>, WikiError> {
        ledger.pending_versions(&self.url)
    }

    /// Load and render one pending edit for review
    pub fn display_edit(&self, ledger: &VersionLedger, version: i64) -> Result<Page, WikiError> {
        self.version_view(ledger, version)
    }

    fn version_view(&self, ledger: &VersionLedger, version: i64) -> Result<Page, WikiError> {
        let content = ledger.content_at(&self.url, version)?;
        let mut page = Page::new(self.path.clone(), format!("{}/{}", self.url, version));
        page.load_content(content);
        page.render();
        Ok(page)
    }

    /// Change the approval status of one version
    pub fn set_approval(
        &self,
        ledger: &VersionLedger,
        version: i64,
        status: bool,
    ) -> Result<(), WikiError> {
        ledger.set_approval(&self.url, version, status)
    }

    /// Approval status of one version, if recorded
    pub fn approval(
        &self,
        ledger: &VersionLedger,
        version: i64,
    ) -> Result<Option<bool>, WikiError> {
        ledger.approval(&self.url, version)
    }

    /// Author of the page's first version
    pub fn author(&self, ledger: &VersionLedger) -> Result<String, WikiError> {
        ledger.author_of(&self.url)
    }

    /// Put the last approved content back on disk, without creating a new
    /// ledger entry. Fails with `NotFound` when no approved version exists.
    pub fn restore_last_version(&mut self, ledger: &VersionLedger) -> Result<(), WikiError> {
        let version = ledger.max_approved_version(&self.url)?.ok_or_else(|| {
            WikiError::NotFound(format!("no approved version of '{}'", self.url))
        })?;
        let content = ledger.content_at(&self.url, version)?;
        self.load_content(content);
        self.render();
        self.write_out()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Page title; falls back to the url when no `title` meta key is set
    pub fn title(&self) -> &str {
        self.meta.get("title").unwrap_or(&self.url)
    }

    pub fn set_title(&mut self, title: &str) {
        self.meta.insert("title", title);
    }

    /// Comma-separated tag string; empty when no `tags` meta key is set
    pub fn tags(&self) -> &str {
        self.meta.get("tags").unwrap_or("")
    }

    pub fn set_tags(&mut self, tags: &str) {
        self.meta.insert("tags", tags);
    }
}
