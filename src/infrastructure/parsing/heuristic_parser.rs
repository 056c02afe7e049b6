//! Pattern-based contact extraction for arbitrary pages
//!
//! Used on pages discovered through web search, where no structure can be
//! assumed. The raw page text is scanned with independent email, phone and
//! Instagram patterns; the first match of each wins. The page title becomes
//! the clinic name, falling back to the page URL.

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::config::compile_selector;
use super::{ExtractionContext, LeadExtractor};
use crate::domain::errors::ConfigurationError;
use crate::domain::lead::{Lead, or_not_available};
use crate::infrastructure::config::{ScraperConfig, compile_pattern};

/// Asset suffixes that the email pattern also matches (`logo@2x.png`)
const ASSET_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

pub struct HeuristicContactParser {
    email_regex: Regex,
    phone_regex: Regex,
    instagram_regex: Regex,
    title_selector: Selector,
}

impl HeuristicContactParser {
    pub fn with_config(config: &ScraperConfig) -> Result<Self, ConfigurationError> {
        Ok(Self {
            email_regex: compile_pattern("email", &config.email_pattern)?,
            phone_regex: compile_pattern("phone", &config.phone_pattern)?,
            instagram_regex: compile_pattern("instagram", &config.instagram_pattern)?,
            title_selector: compile_selector("title")?,
        })
    }

    /// First email on the page, skipping image names such as `logo@2x.png`
    pub fn find_email(&self, text: &str) -> Option<String> {
        self.email_regex
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|candidate| {
                let lower = candidate.to_lowercase();
                !ASSET_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
            })
            .map(str::to_string)
    }

    pub fn find_phone(&self, text: &str) -> Option<String> {
        self.phone_regex.find(text).map(|m| m.as_str().trim().to_string())
    }

    pub fn find_instagram(&self, text: &str) -> Option<String> {
        self.instagram_regex.find(text).map(|m| m.as_str().to_string())
    }

    fn find_title(&self, page: &str) -> Option<String> {
        let document = Html::parse_document(page);
        document
            .select(&self.title_selector)
            .next()
            .map(|title| title.text().collect::<String>())
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|text| !text.is_empty())
    }
}

impl LeadExtractor for HeuristicContactParser {
    fn source_name(&self) -> &str {
        "search"
    }

    fn extract(&self, page: &str, context: &ExtractionContext) -> Vec<Lead> {
        let mut lead = Lead::unknown(&context.city, &context.source_url, context.date_added);

        lead.name = self.find_title(page).unwrap_or_else(|| context.source_url.clone());
        lead.website = context.source_url.clone();
        lead.email = or_not_available(self.find_email(page));
        lead.phone = or_not_available(self.find_phone(page));
        lead.instagram = or_not_available(self.find_instagram(page));

        debug!(
            "Heuristic extraction for {}: email={}, phone={}, instagram={}",
            context.source_url, lead.email, lead.phone, lead.instagram
        );
        vec![lead]
    }
}
