//! Parsing context for lead extraction

use chrono::NaiveDate;

/// Where a page came from and what every lead from it should carry
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// City supplied by the caller
    pub city: String,

    /// Page the leads are extracted from; also the base for relative links
    pub source_url: String,

    /// Ingestion date stamped on every lead
    pub date_added: NaiveDate,
}

impl ExtractionContext {
    pub fn new(city: impl Into<String>, source_url: impl Into<String>, date_added: NaiveDate) -> Self {
        Self {
            city: city.into(),
            source_url: source_url.into(),
            date_added,
        }
    }
}
