//! Dental Leads - clinic contact scraping with per-city deduplicated storage
//!
//! Leads are collected from two fixed directory sites and from web search,
//! filtered against everything already stored for the city, and appended to
//! a per-city table. A read-only reporting view aggregates the same tables.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
