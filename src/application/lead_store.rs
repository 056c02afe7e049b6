//! Per-city lead tables with website/email deduplication
//!
//! Each city owns one table whose first row is the fixed lead header.
//! Lookup by city is case-insensitive; a new table is named after the
//! title-cased city. A table whose header differs from the expected layout
//! is never modified.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::StorageError;
use crate::domain::lead::{EMAIL_COLUMN, LEAD_HEADERS, Lead, WEBSITE_COLUMN, header_row, is_present, normalize_city};
use crate::domain::repositories::{Row, TableBackend};

/// Websites and emails already known for one city
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupSets {
    websites: HashSet<String>,
    emails: HashSet<String>,
}

fn website_key(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn email_key(value: &str) -> String {
    value.trim().to_lowercase()
}

impl DedupSets {
    /// Collect keys from data rows laid out as [`LEAD_HEADERS`]
    pub fn from_rows(rows: &[Row]) -> Self {
        let website_idx = column_index(WEBSITE_COLUMN);
        let email_idx = column_index(EMAIL_COLUMN);

        let mut sets = Self::default();
        for row in rows {
            if let Some(website) = row.get(website_idx) {
                sets.insert_website(website);
            }
            if let Some(email) = row.get(email_idx) {
                sets.insert_email(email);
            }
        }
        sets
    }

    fn insert_website(&mut self, value: &str) {
        if is_present(value) {
            self.websites.insert(website_key(value));
        }
    }

    fn insert_email(&mut self, value: &str) {
        if is_present(value) {
            self.emails.insert(email_key(value));
        }
    }

    pub fn knows_website(&self, website: &str) -> bool {
        is_present(website) && self.websites.contains(&website_key(website))
    }

    pub fn knows_email(&self, email: &str) -> bool {
        is_present(email) && self.emails.contains(&email_key(email))
    }

    /// Collides on website first, then on email
    pub fn is_duplicate(&self, lead: &Lead) -> bool {
        self.knows_website(&lead.website) || self.knows_email(&lead.email)
    }

    pub fn remember(&mut self, lead: &Lead) {
        self.insert_website(&lead.website);
        self.insert_email(&lead.email);
    }

    pub fn website_count(&self) -> usize {
        self.websites.len()
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }
}

fn column_index(name: &str) -> usize {
    LEAD_HEADERS.iter().position(|h| *h == name).unwrap_or_default()
}

/// The deduplication store over a table backend
#[derive(Clone)]
pub struct LeadStore {
    backend: Arc<dyn TableBackend>,
}

impl LeadStore {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    /// Existing table name for a city, matched case-insensitively
    pub async fn find_table(&self, city: &str) -> Result<Option<String>, StorageError> {
        let wanted = city.trim().to_lowercase();
        let tables = self.backend.list_tables().await?;
        Ok(tables.into_iter().find(|name| name.trim().to_lowercase() == wanted))
    }

    /// Known websites and emails for a city; empty when the table does not exist yet
    pub async fn load(&self, city: &str) -> Result<DedupSets, StorageError> {
        let Some(table) = self.find_table(city).await? else {
            debug!("No table for '{}' yet", city);
            return Ok(DedupSets::default());
        };

        let rows = self.backend.read_all_rows(&table).await?;
        let Some((header, data)) = rows.split_first() else {
            return Ok(DedupSets::default());
        };
        check_header(&table, header)?;

        let sets = DedupSets::from_rows(data);
        info!(
            "📚 Loaded '{}': {} row(s), {} known website(s), {} known email(s)",
            table,
            data.len(),
            sets.website_count(),
            sets.email_count()
        );
        Ok(sets)
    }

    /// Append leads as one batch, creating the city table first if needed
    pub async fn append(&self, city: &str, leads: &[Lead]) -> Result<(), StorageError> {
        if leads.is_empty() {
            return Ok(());
        }

        let mut rows: Vec<Row> = Vec::with_capacity(leads.len() + 1);
        let table = match self.find_table(city).await? {
            Some(table) => {
                let existing = self.backend.read_all_rows(&table).await?;
                match existing.first() {
                    Some(header) => check_header(&table, header)?,
                    // a table with no rows at all only gains the header
                    None => rows.push(header_row()),
                }
                table
            }
            None => {
                let table = normalize_city(city);
                self.backend.create_table(&table, &header_row()).await?;
                table
            }
        };

        rows.extend(leads.iter().map(Lead::to_row));
        self.backend.append_rows(&table, &rows).await?;
        info!("💾 Appended {} lead(s) to '{}'", leads.len(), table);
        Ok(())
    }
}

fn check_header(table: &str, header: &[String]) -> Result<(), StorageError> {
    if header.iter().map(String::as_str).eq(LEAD_HEADERS.iter().copied()) {
        Ok(())
    } else {
        Err(StorageError::SchemaMismatch {
            table: table.to_string(),
            found: header.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::NOT_AVAILABLE;
    use crate::infrastructure::sheet_store::SqliteSheetBackend;
    use chrono::NaiveDate;

    fn lead(website: &str, email: &str) -> Lead {
        let mut lead = Lead::unknown("Lahore", "https://dir.test", NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        lead.website = website.to_string();
        lead.email = email.to_string();
        lead
    }

    async fn store() -> (Arc<SqliteSheetBackend>, LeadStore) {
        let backend = Arc::new(SqliteSheetBackend::in_memory().await.unwrap());
        (backend.clone(), LeadStore::new(backend))
    }

    #[test]
    fn test_placeholder_never_collides() {
        let mut sets = DedupSets::default();
        sets.remember(&lead(NOT_AVAILABLE, NOT_AVAILABLE));
        assert_eq!(sets.website_count(), 0);
        assert!(!sets.is_duplicate(&lead(NOT_AVAILABLE, NOT_AVAILABLE)));
    }

    #[test]
    fn test_collision_on_either_key() {
        let mut sets = DedupSets::default();
        sets.remember(&lead("https://smile.pk/", "Info@Smile.pk"));
        assert!(sets.is_duplicate(&lead("https://smile.pk", NOT_AVAILABLE)));
        assert!(sets.is_duplicate(&lead("https://other.pk", "info@smile.pk")));
        assert!(!sets.is_duplicate(&lead("https://other.pk", "hello@other.pk")));
    }

    #[tokio::test]
    async fn test_load_missing_table_is_empty() {
        let (_, store) = store().await;
        assert_eq!(store.load("Lahore").await.unwrap(), DedupSets::default());
    }

    #[tokio::test]
    async fn test_append_creates_table_then_load_sees_rows() {
        let (backend, store) = store().await;
        store.append("lahore", &[lead("https://a.pk", "a@a.pk"), lead(NOT_AVAILABLE, NOT_AVAILABLE)]).await.unwrap();

        assert_eq!(backend.list_tables().await.unwrap(), vec!["Lahore"]);
        let rows = backend.read_all_rows("Lahore").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_row());

        let sets = store.load("LAHORE").await.unwrap();
        assert!(sets.knows_website("https://a.pk"));
        assert!(sets.knows_email("a@a.pk"));
        assert_eq!(sets.website_count(), 1);
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup_reuses_existing_table() {
        let (backend, store) = store().await;
        backend.create_table("karachi", &header_row()).await.unwrap();

        store.append("Karachi", &[lead("https://k.pk", NOT_AVAILABLE)]).await.unwrap();
        assert_eq!(backend.list_tables().await.unwrap(), vec!["karachi"]);
        assert_eq!(store.find_table(" KARACHI ").await.unwrap().as_deref(), Some("karachi"));
    }

    #[tokio::test]
    async fn test_header_mismatch_is_rejected_without_changes() {
        let (backend, store) = store().await;
        let legacy: Row = vec!["Name".into(), "Website".into()];
        backend.create_table("Quetta", &legacy).await.unwrap();
        backend.append_rows("Quetta", &[vec!["Old".into(), "https://old.pk".into()]]).await.unwrap();

        assert!(matches!(store.load("Quetta").await, Err(StorageError::SchemaMismatch { .. })));
        assert!(matches!(
            store.append("Quetta", &[lead("https://q.pk", NOT_AVAILABLE)]).await,
            Err(StorageError::SchemaMismatch { .. })
        ));
        assert_eq!(backend.read_all_rows("Quetta").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_append_creates_nothing() {
        let (backend, store) = store().await;
        store.append("Multan", &[]).await.unwrap();
        assert!(backend.list_tables().await.unwrap().is_empty());
    }
}
