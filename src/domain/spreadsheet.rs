use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::ConfigurationError;

/// Identifier of the spreadsheet holding the city tables
///
/// Accepts either a full sheet URL (`https://host/spreadsheets/d/<id>/edit`)
/// or the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        let trimmed = input.trim();
        let invalid = || ConfigurationError::InvalidSpreadsheetId(input.to_string());

        if trimmed.contains('/') {
            let pattern = Regex::new(r"/d/([A-Za-z0-9_-]+)").map_err(|_| invalid())?;
            return pattern
                .captures(trimmed)
                .and_then(|caps| caps.get(1))
                .map(|m| Self(m.as_str().to_string()))
                .ok_or_else(invalid);
        }

        let bare_id = !trimmed.is_empty()
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if bare_id {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SpreadsheetId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SpreadsheetId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SpreadsheetId> for String {
    fn from(id: SpreadsheetId) -> Self {
        id.0
    }
}

impl fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://docs.google.com/spreadsheets/d/1j0kCwS8isclz-AVE_Wgl1/edit#gid=0",
        "1j0kCwS8isclz-AVE_Wgl1"
    )]
    #[case("https://docs.google.com/spreadsheets/d/abc123", "abc123")]
    #[case("  leads_2024-q3 ", "leads_2024-q3")]
    fn test_parse_valid_ids(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(SpreadsheetId::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("https://docs.google.com/spreadsheets/edit")]
    #[case("my sheet")]
    #[case("../../etc/passwd")]
    fn test_parse_invalid_ids(#[case] input: &str) {
        assert!(matches!(
            SpreadsheetId::parse(input),
            Err(ConfigurationError::InvalidSpreadsheetId(_))
        ));
    }
}
