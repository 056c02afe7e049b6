//! Domain module - lead records, invocation parameters and collaborator contracts
//!
//! Nothing in here performs I/O. The infrastructure layer implements the
//! traits from [`repositories`], and the application layer drives them.

pub mod errors;
pub mod lead;
pub mod repositories;
pub mod source_mode;
pub mod spreadsheet;

// Re-export commonly used items for convenience
pub use errors::{ConfigurationError, FetchError, IngestionError, StorageError};
pub use lead::{LEAD_HEADERS, Lead, NOT_AVAILABLE};
pub use repositories::{PageFetcher, Row, SearchProvider, TableBackend};
pub use source_mode::SourceMode;
pub use spreadsheet::SpreadsheetId;
