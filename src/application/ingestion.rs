//! Lead ingestion pipeline
//!
//! One run collects up to N new leads for a city: dedup sets are loaded,
//! directory A then directory B are scraped, web search fills whatever is
//! still missing, and every accepted lead is appended in one batch at the
//! end. Fetch and search failures only cost the affected page; configuration
//! and storage errors end the run.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use super::lead_store::{DedupSets, LeadStore};
use crate::domain::errors::{ConfigurationError, IngestionError};
use crate::domain::lead::{Lead, normalize_city};
use crate::domain::repositories::{PageFetcher, SearchProvider};
use crate::domain::source_mode::SourceMode;
use crate::domain::spreadsheet::SpreadsheetId;
use crate::infrastructure::config::{AppConfig, DirectorySourceConfig, defaults};
use crate::infrastructure::pacing::PolitenessDelay;
use crate::infrastructure::parsing::{DirectoryListingParser, ExtractionContext, HeuristicContactParser, LeadExtractor};

/// Validated invocation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    spreadsheet: SpreadsheetId,
    city: String,
    target: usize,
    mode: SourceMode,
}

impl IngestionRequest {
    /// Validate raw invocation input before any network activity
    pub fn new(spreadsheet: &str, city: &str, target: i64, mode: &str) -> Result<Self, ConfigurationError> {
        let spreadsheet = SpreadsheetId::parse(spreadsheet)?;
        let city = normalize_city(city);
        if city.is_empty() {
            return Err(ConfigurationError::EmptyCity);
        }
        let target = usize::try_from(target)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigurationError::InvalidTargetCount(target))?;
        let mode = mode.parse::<SourceMode>()?;

        Ok(Self { spreadsheet, city, target, mode })
    }

    pub fn spreadsheet(&self) -> &SpreadsheetId {
        &self.spreadsheet
    }

    /// Title-cased city
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }
}

struct DirectorySource {
    config: DirectorySourceConfig,
    parser: DirectoryListingParser,
}

/// Mutable state of one run
struct RunState {
    city: String,
    target: usize,
    today: NaiveDate,
    known: DedupSets,
    accepted: Vec<Lead>,
    page_delay: PolitenessDelay,
}

impl RunState {
    fn is_full(&self) -> bool {
        self.accepted.len() >= self.target
    }

    /// Accept a candidate unless it collides with a known or already accepted lead.
    /// Candidates without a website and an email have no dedup key and are dropped.
    fn offer(&mut self, lead: Lead, source: &str) -> bool {
        if self.is_full() {
            return false;
        }
        if !lead.has_website() && !lead.has_email() {
            debug!("{}: '{}' has no website or email; skipped", source, lead.name);
            return false;
        }
        if self.known.is_duplicate(&lead) {
            debug!("{}: duplicate skipped ({} / {})", source, lead.website, lead.email);
            return false;
        }
        debug!("{}: accepted '{}' ({})", source, lead.name, lead.website);
        self.known.remember(&lead);
        self.accepted.push(lead);
        true
    }
}

/// Fetch → extract → dedupe → append
pub struct IngestionPipeline {
    config: AppConfig,
    fetcher: Arc<dyn PageFetcher>,
    search: Arc<dyn SearchProvider>,
    store: LeadStore,
    directories: Vec<DirectorySource>,
    heuristic: HeuristicContactParser,
}

impl IngestionPipeline {
    /// Build extractors from configuration; nothing touches the network here
    pub fn new(
        config: AppConfig,
        fetcher: Arc<dyn PageFetcher>,
        search: Arc<dyn SearchProvider>,
        store: LeadStore,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let directories = [&config.sources.directory_a, &config.sources.directory_b]
            .into_iter()
            .map(|source| -> Result<DirectorySource, ConfigurationError> {
                Ok(DirectorySource {
                    config: source.clone(),
                    parser: DirectoryListingParser::with_config(&source.name, &source.selectors)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        let heuristic = HeuristicContactParser::with_config(&config.scraper)?;

        Ok(Self {
            config,
            fetcher,
            search,
            store,
            directories,
            heuristic,
        })
    }

    /// Run with today's local date stamped on new leads
    pub async fn run(&self, request: &IngestionRequest) -> Result<Vec<Lead>, IngestionError> {
        self.run_on(request, Local::now().date_naive()).await
    }

    pub async fn run_on(&self, request: &IngestionRequest, today: NaiveDate) -> Result<Vec<Lead>, IngestionError> {
        info!(
            "🚀 Ingestion started: city={}, target={}, mode={}, spreadsheet={}",
            request.city(),
            request.target(),
            request.mode(),
            request.spreadsheet()
        );

        let known = self.store.load(request.city()).await?;
        let mut state = RunState {
            city: request.city().to_string(),
            target: request.target(),
            today,
            known,
            accepted: Vec::new(),
            page_delay: PolitenessDelay::new(
                "page",
                self.config.scraper.delay_min_ms,
                self.config.scraper.delay_max_ms,
            )?,
        };

        if request.mode().includes_directories() {
            self.collect_from_directories(&mut state).await;
        }
        if request.mode().includes_search() && !state.is_full() {
            self.collect_from_search(&mut state).await?;
        } else if request.mode().includes_search() {
            info!("Target reached from directories; search skipped");
        }

        let accepted = state.accepted;
        if accepted.is_empty() {
            info!("No new leads for {}", request.city());
            return Ok(accepted);
        }

        self.store.append(request.city(), &accepted).await?;
        info!("✅ Ingestion finished: {} new lead(s) for {}", accepted.len(), request.city());
        Ok(accepted)
    }

    async fn collect_from_directories(&self, state: &mut RunState) {
        for source in &self.directories {
            if state.is_full() {
                break;
            }

            let url = source.config.url_for_city(&state.city);
            state.page_delay.wait().await;
            let page = match self.fetcher.fetch_text(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("⚠️ {}: skipping {} for {}: {}", source.parser.source_name(), url, state.city, e);
                    continue;
                }
            };

            let context = ExtractionContext::new(&state.city, &url, state.today);
            let candidates = source.parser.extract(&page, &context);
            let before = state.accepted.len();
            for lead in candidates {
                state.offer(lead, source.parser.source_name());
            }
            info!(
                "📋 {}: {} new lead(s) for {} ({} / {})",
                source.parser.source_name(),
                state.accepted.len() - before,
                state.city,
                state.accepted.len(),
                state.target
            );
        }
    }

    async fn collect_from_search(&self, state: &mut RunState) -> Result<(), ConfigurationError> {
        let search_config = &self.config.search;
        let mut query_delay = PolitenessDelay::new(
            "query",
            search_config.query_delay_min_ms,
            search_config.query_delay_max_ms,
        )?;
        let mut visited: HashSet<String> = HashSet::new();

        for template in defaults::SEARCH_QUERY_TEMPLATES {
            if state.is_full() {
                break;
            }

            let query = template.replace("{city}", &state.city);
            query_delay.wait().await;
            let results = match self.search.search(&query, search_config.results_per_query).await {
                Ok(results) => results,
                Err(e) => {
                    warn!("⚠️ Search '{}' failed: {}", query, e);
                    continue;
                }
            };

            for url in results {
                if state.is_full() {
                    break;
                }
                if state.known.knows_website(&url) || !visited.insert(url.clone()) {
                    debug!("search: known URL skipped: {}", url);
                    continue;
                }

                if search_config.delay_between_result_fetches {
                    state.page_delay.wait().await;
                }
                let page = match self.fetcher.fetch_text(&url).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("⚠️ search: skipping {}: {}", url, e);
                        continue;
                    }
                };

                let context = ExtractionContext::new(&state.city, &url, state.today);
                for lead in self.heuristic.extract(&page, &context) {
                    state.offer(lead, self.heuristic.source_name());
                }
            }
        }

        info!("🔍 Search phase done: {} / {} lead(s) for {}", state.accepted.len(), state.target, state.city);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_request_normalizes_city() {
        let request = IngestionRequest::new("abc_123", "  lahore ", 5, "Directories").unwrap();
        assert_eq!(request.city(), "Lahore");
        assert_eq!(request.target(), 5);
        assert_eq!(request.mode(), SourceMode::Directories);
        assert_eq!(request.spreadsheet().as_str(), "abc_123");
    }

    #[test]
    fn test_request_accepts_sheet_url() {
        let request = IngestionRequest::new(
            "https://docs.google.com/spreadsheets/d/1AbC-xyz_9/edit#gid=0",
            "Karachi",
            1,
            "both",
        )
        .unwrap();
        assert_eq!(request.spreadsheet().as_str(), "1AbC-xyz_9");
    }

    #[rstest]
    #[case("", "Lahore", 5, "both", ConfigurationError::InvalidSpreadsheetId(String::new()))]
    #[case("abc", "   ", 5, "both", ConfigurationError::EmptyCity)]
    #[case("abc", "Lahore", 0, "both", ConfigurationError::InvalidTargetCount(0))]
    #[case("abc", "Lahore", -3, "both", ConfigurationError::InvalidTargetCount(-3))]
    #[case("abc", "Lahore", 5, "bing", ConfigurationError::InvalidSourceMode("bing".into()))]
    fn test_request_validation(
        #[case] sheet: &str,
        #[case] city: &str,
        #[case] target: i64,
        #[case] mode: &str,
        #[case] expected: ConfigurationError,
    ) {
        assert_eq!(IngestionRequest::new(sheet, city, target, mode).unwrap_err(), expected);
    }
}
