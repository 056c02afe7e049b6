//! Parsing configuration for HTML extraction
//!
//! CSS selectors describing one listing block of a directory page.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigurationError;

/// Structural markers of a directory listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Repeated block holding one clinic
    pub container: String,

    /// Element whose text is the clinic name
    pub name: String,

    /// Element whose `href` is the clinic website
    pub link: String,

    /// Element whose text is the phone number, if the directory shows one
    pub phone: Option<String>,
}

impl ListingSelectors {
    /// Clinic directory: `.listing` blocks with an `h2` title and the first link
    pub fn directory_a() -> Self {
        Self {
            container: ".listing".to_string(),
            name: "h2".to_string(),
            link: "a[href]".to_string(),
            phone: None,
        }
    }

    /// Business directory: `.result` blocks with a business-name link and phone list
    pub fn directory_b() -> Self {
        Self {
            container: ".result".to_string(),
            name: "a.business-name".to_string(),
            link: "a.business-name".to_string(),
            phone: Some(".phones".to_string()),
        }
    }

    pub fn compile(&self) -> Result<CompiledSelectors, ConfigurationError> {
        Ok(CompiledSelectors {
            container: compile_selector(&self.container)?,
            name: compile_selector(&self.name)?,
            link: compile_selector(&self.link)?,
            phone: self.phone.as_deref().map(compile_selector).transpose()?,
        })
    }
}

/// Parsed form of [`ListingSelectors`]
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub container: Selector,
    pub name: Selector,
    pub link: Selector,
    pub phone: Option<Selector>,
}

pub fn compile_selector(selector: &str) -> Result<Selector, ConfigurationError> {
    Selector::parse(selector).map_err(|e| ConfigurationError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
