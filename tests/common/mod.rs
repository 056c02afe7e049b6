//! Shared fakes for pipeline integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use dental_leads_lib::application::{IngestionPipeline, LeadStore};
use dental_leads_lib::domain::repositories::{PageFetcher, SearchProvider};
use dental_leads_lib::domain::FetchError;
use dental_leads_lib::infrastructure::config::AppConfig;
use dental_leads_lib::infrastructure::SqliteSheetBackend;

pub const DIRECTORY_A: &str = "https://dir-a.test/dentists/lahore";
pub const DIRECTORY_B: &str = "https://dir-b.test/search?geo=Lahore";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

/// Pages served by URL; unknown URLs fail with a 404
#[derive(Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, Result<String, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_failure(self, url: &str, error: FetchError) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages.lock().unwrap().get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status { status: 404, url: url.to_string() })
        })
    }
}

/// Canned results per query with a call counter
#[derive(Default)]
pub struct StaticSearch {
    results: HashMap<String, Vec<String>>,
    queries: AtomicUsize,
}

impl StaticSearch {
    pub fn with_results(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.insert(query.to_string(), urls.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, FetchError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let mut urls = self.results.get(query).cloned().unwrap_or_default();
        urls.truncate(max_results);
        Ok(urls)
    }
}

/// Default configuration with test directory URLs and no delays
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.scraper.delay_min_ms = 0;
    config.scraper.delay_max_ms = 0;
    config.sources.directory_a.url_template = "https://dir-a.test/dentists/{city}".to_string();
    config.sources.directory_a.lowercase_city = true;
    config.sources.directory_b.url_template = "https://dir-b.test/search?geo={city}".to_string();
    config.sources.directory_b.lowercase_city = false;
    config
}

pub struct Harness {
    pub backend: Arc<SqliteSheetBackend>,
    pub fetcher: Arc<StaticFetcher>,
    pub search: Arc<StaticSearch>,
    pub pipeline: IngestionPipeline,
}

pub async fn harness(fetcher: StaticFetcher, search: StaticSearch) -> Harness {
    let backend = Arc::new(SqliteSheetBackend::in_memory().await.unwrap());
    harness_on(backend, fetcher, search)
}

pub fn harness_on(backend: Arc<SqliteSheetBackend>, fetcher: StaticFetcher, search: StaticSearch) -> Harness {
    let fetcher = Arc::new(fetcher);
    let search = Arc::new(search);
    let pipeline = IngestionPipeline::new(
        test_config(),
        fetcher.clone(),
        search.clone(),
        LeadStore::new(backend.clone()),
    )
    .unwrap();
    Harness { backend, fetcher, search, pipeline }
}

/// Directory A page with one `.listing` block per (name, website)
pub fn directory_a_page(clinics: &[(&str, &str)]) -> String {
    let blocks: String = clinics
        .iter()
        .map(|(name, href)| format!(r#"<div class="listing"><h2>{name}</h2><a href="{href}">Visit</a></div>"#))
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

/// Directory B page with one `.result` block per (name, website, phone)
pub fn directory_b_page(clinics: &[(&str, &str, &str)]) -> String {
    let blocks: String = clinics
        .iter()
        .map(|(name, href, phone)| {
            format!(
                r#"<div class="result"><a class="business-name" href="{href}">{name}</a><div class="phones">{phone}</div></div>"#
            )
        })
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

/// Arbitrary clinic homepage for the heuristic extractor
pub fn contact_page(title: &str, email: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        Email us: {email} or call 0300-1234567
        </body></html>"#
    )
}
