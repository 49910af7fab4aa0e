pub mod content_service;
pub mod history_service;
pub mod ledger_service;

pub use content_service::ContentStore;
pub use history_service::HistoryStore;
pub use ledger_service::VersionLedger;
