//! Folio - a file-backed Markdown wiki core
//!
//! Pages live as Markdown files on disk, every save is recorded in a
//! SQLite version ledger with a per-edit approval workflow, and the index
//! powers regex search and autocomplete suggestions. The web layer is an
//! external collaborator: it calls into this crate and renders the results.

pub mod config;
pub mod errors;
pub mod logger;
pub mod page;
pub mod render;
pub mod services;
pub mod suggest;
pub mod types;
pub mod utils;
pub mod wiki;

// Re-export commonly used items
pub use config::Config;
pub use errors::WikiError;
pub use logger::Logger;
pub use page::Page;
pub use render::{Processor, TextFilter, UrlFormatter, wikilink};
pub use services::{ContentStore, HistoryStore, VersionLedger};
pub use suggest::{Dropdown, DropdownResponse, DropdownSearch, HistorySearch, SuggestionSearch};
pub use types::{
    DEFAULT_SEARCH_ATTRS, HistoryEntry, HistoryItem, Meta, PageVersion, SearchAttr,
    SuggestionItem,
};
pub use wiki::Wiki;

// Re-export utility functions
pub use utils::{clean_url, escape_attr, escape_html};
