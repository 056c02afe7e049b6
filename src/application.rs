//! Application layer - the ingestion pipeline and reporting use cases
//!
//! Both entry points of the binary (`scrape` and `report`) go through the
//! types in here; nothing in this layer knows which concrete backend,
//! fetcher or search engine it is driving.

pub mod ingestion;
pub mod lead_store;
pub mod reporting;

// Re-export commonly used items
pub use ingestion::{IngestionPipeline, IngestionRequest};
pub use lead_store::{DedupSets, LeadStore};
pub use reporting::{LeadReport, ReportingView, build_report};
