//! Infrastructure layer: configuration, HTTP, parsing, search and storage
//!
//! Everything here talks to the outside world (network, filesystem, SQLite)
//! and is reached from the application layer through the traits in
//! [`crate::domain::repositories`].

pub mod config;
pub mod http_client;
pub mod logging;
pub mod pacing;
pub mod parsing;
pub mod search;
pub mod sheet_store;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use http_client::HttpClient;
pub use logging::{get_log_directory, init_logging_with_config};
pub use pacing::PolitenessDelay;
pub use parsing::{DirectoryListingParser, ExtractionContext, HeuristicContactParser, LeadExtractor};
pub use search::DuckDuckGoSearch;
pub use sheet_store::SqliteSheetBackend;
