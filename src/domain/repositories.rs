//! Collaborator contracts consumed by the ingestion pipeline
//!
//! Storage, page fetching and web search are all reached through these
//! traits so the pipeline can run against SQLite and live HTTP in production
//! and against in-memory fakes in tests.

use async_trait::async_trait;

use super::errors::{FetchError, StorageError};

/// One row of a table, as strings in column order
pub type Row = Vec<String>;

/// Spreadsheet-like storage holding one named table per city
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Names of every table, in creation order
    async fn list_tables(&self) -> Result<Vec<String>, StorageError>;

    /// Create a table whose first row is `header`
    async fn create_table(&self, name: &str, header: &[String]) -> Result<(), StorageError>;

    /// Every row of the table including the header row
    async fn read_all_rows(&self, name: &str) -> Result<Vec<Row>, StorageError>;

    /// Append rows after the last existing row, as one batch
    async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StorageError>;
}

/// Retrieves a page body; retries are internal to one call
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Web search returning result URLs for a query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, FetchError>;
}
