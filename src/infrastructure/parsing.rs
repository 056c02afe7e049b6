//! HTML parsing infrastructure for lead extraction
//!
//! Every extractor turns one page body into zero or more candidate leads.
//! Extraction never fails: a missing or malformed element degrades the
//! affected field to "N/A" and the rest of the page is still processed.

pub mod config;
pub mod context;
pub mod heuristic_parser;
pub mod listing_parser;

// Re-export public types
pub use config::ListingSelectors;
pub use context::ExtractionContext;
pub use heuristic_parser::HeuristicContactParser;
pub use listing_parser::DirectoryListingParser;

use crate::domain::lead::Lead;

/// Page text/markup to candidate leads
pub trait LeadExtractor: Send + Sync {
    /// Label used in logs
    fn source_name(&self) -> &str;

    /// Extract candidate leads from a page body
    fn extract(&self, page: &str, context: &ExtractionContext) -> Vec<Lead>;
}
