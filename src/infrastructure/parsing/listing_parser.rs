//! Directory listing parser
//!
//! Fixed-structure directory pages repeat one block per clinic. Each block
//! yields exactly one lead; sub-elements that are missing or malformed
//! degrade to "N/A" without dropping the block.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::config::{CompiledSelectors, ListingSelectors};
use super::{ExtractionContext, LeadExtractor};
use crate::domain::errors::ConfigurationError;
use crate::domain::lead::{Lead, NOT_AVAILABLE, or_not_available};

/// Parser for one directory site
pub struct DirectoryListingParser {
    name: String,
    selectors: CompiledSelectors,
}

impl DirectoryListingParser {
    /// Create parser with custom selector configuration
    pub fn with_config(name: &str, selectors: &ListingSelectors) -> Result<Self, ConfigurationError> {
        Ok(Self {
            name: name.to_string(),
            selectors: selectors.compile()?,
        })
    }

    fn extract_block(&self, block: &ElementRef, context: &ExtractionContext) -> Lead {
        let mut lead = Lead::unknown(&context.city, &context.source_url, context.date_added);

        lead.name = or_not_available(extract_text(block, &self.selectors.name));
        lead.website = block
            .select(&self.selectors.link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve_url(href, &context.source_url))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        if let Some(phone) = &self.selectors.phone {
            lead.phone = or_not_available(extract_text(block, phone));
        }

        lead
    }
}

impl LeadExtractor for DirectoryListingParser {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn extract(&self, page: &str, context: &ExtractionContext) -> Vec<Lead> {
        let document = Html::parse_document(page);
        let leads: Vec<Lead> = document
            .select(&self.selectors.container)
            .map(|block| self.extract_block(&block, context))
            .collect();

        debug!("{}: extracted {} listing blocks from {}", self.name, leads.len(), context.source_url);
        leads
    }
}

/// Whitespace-collapsed text of the first match
fn extract_text(element: &ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

/// Resolve a possibly relative href against the page it was found on
fn resolve_url(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    // absolute links are stored verbatim
    if let Ok(absolute) = Url::parse(href) {
        return matches!(absolute.scheme(), "http" | "https").then(|| href.to_string());
    }
    Url::parse(base_url).and_then(|base| base.join(href)).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context() -> ExtractionContext {
        ExtractionContext::new(
            "Lahore",
            "https://www.yellowpages.test/search?geo=Lahore",
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
        )
    }

    #[test]
    fn test_directory_a_blocks() {
        let parser = DirectoryListingParser::with_config("a", &ListingSelectors::directory_a()).unwrap();
        let html = r#"
            <div class="listing"><h2> Smile   Dental </h2><a href="https://smile.pk">Visit</a></div>
            <div class="listing"><h2>No Link Clinic</h2></div>
            <div class="listing"><a href="https://anon.pk">Visit</a></div>
        "#;

        let leads = parser.extract(html, &context());
        assert_eq!(leads.len(), 3);
        assert_eq!(leads[0].name, "Smile Dental");
        assert_eq!(leads[0].website, "https://smile.pk");
        assert_eq!(leads[0].email, NOT_AVAILABLE);
        assert_eq!(leads[0].phone, NOT_AVAILABLE);
        assert_eq!(leads[1].website, NOT_AVAILABLE);
        assert_eq!(leads[2].name, NOT_AVAILABLE);
        assert!(leads.iter().all(|l| l.city == "Lahore" && l.instagram == NOT_AVAILABLE));
    }

    #[test]
    fn test_directory_b_blocks_with_phone_and_relative_link() {
        let parser = DirectoryListingParser::with_config("b", &ListingSelectors::directory_b()).unwrap();
        let html = r#"
            <div class="result">
              <a class="business-name" href="/lahore/mip/bright-teeth-123">Bright Teeth</a>
              <div class="phones">(042) 555-0101</div>
            </div>
            <div class="result"><a class="business-name">No Href</a></div>
        "#;

        let leads = parser.extract(html, &context());
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "Bright Teeth");
        assert_eq!(leads[0].website, "https://www.yellowpages.test/lahore/mip/bright-teeth-123");
        assert_eq!(leads[0].phone, "(042) 555-0101");
        assert_eq!(leads[0].source_url, "https://www.yellowpages.test/search?geo=Lahore");
        assert_eq!(leads[1].website, NOT_AVAILABLE);
        assert_eq!(leads[1].phone, NOT_AVAILABLE);
    }

    #[test]
    fn test_page_without_blocks_yields_nothing() {
        let parser = DirectoryListingParser::with_config("a", &ListingSelectors::directory_a()).unwrap();
        assert!(parser.extract("<html><body>blocked</body></html>", &context()).is_empty());
        assert!(parser.extract("", &context()).is_empty());
    }

    #[test]
    fn test_url_resolution() {
        let base = "https://example.com/dir/page";
        assert_eq!(resolve_url("/product/123", base).unwrap(), "https://example.com/product/123");
        assert_eq!(resolve_url("https://other.com/test", base).unwrap(), "https://other.com/test");
        assert_eq!(resolve_url("relative/path", base).unwrap(), "https://example.com/dir/relative/path");
        assert!(resolve_url("#top", base).is_none());
        assert!(resolve_url("mailto:a@b.co", base).is_none());
    }
}
