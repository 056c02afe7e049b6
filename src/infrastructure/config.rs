//! Configuration infrastructure
//!
//! Contains configuration loading and management for lead scraping.
//!
//! Every tunable the scraper relies on (header schema, extraction patterns,
//! retry budget, timeout, politeness delay, user-agent pool, directory
//! selectors) lives in [`AppConfig`] and is handed to each component at
//! construction. Nothing reads global mutable state.

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::errors::ConfigurationError;
use crate::domain::lead::LEAD_HEADERS;
use crate::infrastructure::parsing::config::ListingSelectors;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fetching and extraction behaviour
    pub scraper: ScraperConfig,

    /// Fixed-structure directory sources
    pub sources: DirectorySourcesConfig,

    /// Web search settings
    pub search: SearchConfig,

    /// Where spreadsheets are persisted
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Fetcher and heuristic extractor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Expected header row of every city table
    pub header_schema: Vec<String>,

    /// Pattern for the first email address on a page
    pub email_pattern: String,

    /// Pattern for the first phone number on a page
    pub phone_pattern: String,

    /// Pattern for the first Instagram profile link on a page
    pub instagram_pattern: String,

    /// Total attempts per fetch, including the first one
    pub max_retries: u32,

    /// HTTP statuses that trigger another attempt
    pub retry_statuses: Vec<u16>,

    /// Base of the exponential backoff between attempts
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Lower bound of the randomized pause between page fetches
    pub delay_min_ms: u64,

    /// Upper bound of the randomized pause between page fetches
    pub delay_max_ms: u64,

    /// Client identities; one is picked per session
    pub user_agents: Vec<String>,
}

/// The two directory sources, tried in order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySourcesConfig {
    pub directory_a: DirectorySourceConfig,
    pub directory_b: DirectorySourceConfig,
}

/// One fixed-structure listing site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySourceConfig {
    /// Short label used in logs
    pub name: String,

    /// Listing URL with a `{city}` placeholder
    pub url_template: String,

    /// Replacement for spaces inside the city slug
    pub city_separator: String,

    /// Lowercase the city before substitution
    pub lowercase_city: bool,

    /// Structural markers of one listing block
    pub selectors: ListingSelectors,
}

impl DirectorySourceConfig {
    /// Listing URL for a city
    pub fn url_for_city(&self, city: &str) -> String {
        let slug = if self.lowercase_city {
            city.trim().to_lowercase()
        } else {
            city.trim().to_string()
        };
        let slug = slug.replace(' ', &self.city_separator);
        self.url_template.replace("{city}", &slug)
    }
}

/// Web search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint with a `{query}` placeholder
    pub endpoint: String,

    /// Maximum result URLs requested per query
    pub results_per_query: usize,

    /// Pause between fetches of individual search results
    pub delay_between_result_fetches: bool,

    /// Lower bound of the pause between two search queries
    pub query_delay_min_ms: u64,

    /// Upper bound of the pause between two search queries
    pub query_delay_max_ms: u64,
}

/// Persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one SQLite file per spreadsheet; defaults to the user data dir
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(ConfigManager::get_app_data_dir()?.join("sheets")),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; defaults to `<data dir>/logs`
    pub log_dir: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            header_schema: LEAD_HEADERS.iter().map(|h| (*h).to_string()).collect(),
            email_pattern: defaults::EMAIL_PATTERN.to_string(),
            phone_pattern: defaults::PHONE_PATTERN.to_string(),
            instagram_pattern: defaults::INSTAGRAM_PATTERN.to_string(),
            max_retries: defaults::MAX_RETRIES,
            retry_statuses: defaults::RETRY_STATUSES.to_vec(),
            backoff_base_ms: defaults::BACKOFF_BASE_MS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            delay_min_ms: defaults::DELAY_MIN_MS,
            delay_max_ms: defaults::DELAY_MAX_MS,
            user_agents: defaults::USER_AGENTS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl Default for DirectorySourcesConfig {
    fn default() -> Self {
        Self {
            directory_a: DirectorySourceConfig {
                name: "whatclinic".to_string(),
                url_template: directories::DIRECTORY_A_URL.to_string(),
                city_separator: "-".to_string(),
                lowercase_city: true,
                selectors: ListingSelectors::directory_a(),
            },
            directory_b: DirectorySourceConfig {
                name: "yellowpages".to_string(),
                url_template: directories::DIRECTORY_B_URL.to_string(),
                city_separator: "+".to_string(),
                lowercase_city: false,
                selectors: ListingSelectors::directory_b(),
            },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::SEARCH_ENDPOINT.to_string(),
            results_per_query: defaults::SEARCH_RESULTS_PER_QUERY,
            delay_between_result_fetches: true,
            query_delay_min_ms: 0,
            query_delay_max_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Check everything that would otherwise fail mid-run
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let scraper = &self.scraper;

        if scraper.header_schema.iter().map(String::as_str).ne(LEAD_HEADERS.iter().copied()) {
            return Err(ConfigurationError::HeaderSchemaMismatch(scraper.header_schema.clone()));
        }
        for (name, pattern) in [
            ("email", &scraper.email_pattern),
            ("phone", &scraper.phone_pattern),
            ("instagram", &scraper.instagram_pattern),
        ] {
            compile_pattern(name, pattern)?;
        }
        if scraper.max_retries == 0 {
            return Err(ConfigurationError::InvalidRetryBudget);
        }
        if scraper.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(ConfigurationError::EmptyUserAgentPool);
        }
        if scraper.delay_min_ms > scraper.delay_max_ms {
            return Err(ConfigurationError::InvalidDelayRange {
                min_ms: scraper.delay_min_ms,
                max_ms: scraper.delay_max_ms,
            });
        }
        if self.search.query_delay_min_ms > self.search.query_delay_max_ms {
            return Err(ConfigurationError::InvalidDelayRange {
                min_ms: self.search.query_delay_min_ms,
                max_ms: self.search.query_delay_max_ms,
            });
        }
        for source in [&self.sources.directory_a, &self.sources.directory_b] {
            source.selectors.compile()?;
        }
        Ok(())
    }
}

/// Compile a configured regex, reporting which one is broken
pub fn compile_pattern(name: &str, pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(pattern).map_err(|e| ConfigurationError::InvalidPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(APP_DIR_NAME);

        Ok(data_dir)
    }

    /// Manager for the default config location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Manager for an explicit config file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { config_path: path.into() }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file could not be parsed: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Reset configuration to defaults (useful for troubleshooting)
    pub async fn reset_to_defaults(&self) -> Result<AppConfig> {
        info!("🔄 Resetting configuration to defaults");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

const APP_DIR_NAME: &str = "dental-leads";

/// Directory listing URLs
pub mod directories {
    /// Clinic directory listing, `{city}` lowercased with spaces as hyphens
    pub const DIRECTORY_A_URL: &str = "https://www.whatclinic.com/dentists/{city}/pakistan";

    /// Business directory search, `{city}` with spaces as plus signs
    pub const DIRECTORY_B_URL: &str =
        "https://www.yellowpages.com/search?search_terms=dentist&geo_location_terms={city}";
}

/// Default configuration values
pub mod defaults {
    pub const MAX_RETRIES: u32 = 5;
    pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
    pub const BACKOFF_BASE_MS: u64 = 1000;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
    pub const DELAY_MIN_MS: u64 = 1000;
    pub const DELAY_MAX_MS: u64 = 3000;

    pub const USER_AGENTS: [&str; 2] = [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ];

    pub const EMAIL_PATTERN: &str = r"[\w.\-+]+@[\w.\-]+\.[A-Za-z]{2,}";
    pub const PHONE_PATTERN: &str = r"\+?\d[\d\s\-\(\)]{7,}\d";
    pub const INSTAGRAM_PATTERN: &str = r"https?://(?:www\.)?instagram\.com/[A-Za-z0-9._\-]+";

    pub const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/?q={query}";
    pub const SEARCH_RESULTS_PER_QUERY: usize = 20;

    /// Queries issued in order when search is enabled
    pub const SEARCH_QUERY_TEMPLATES: [&str; 4] = [
        "dental clinic {city}",
        "top dentists {city}",
        "orthodontist {city}",
        "cosmetic dentist {city}",
    ];

    pub const LOG_LEVEL: &str = "info";
}
