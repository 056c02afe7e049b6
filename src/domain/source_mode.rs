use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ConfigurationError;

/// Which lead sources an ingestion run may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Directories,
    Google,
    #[default]
    Both,
}

impl SourceMode {
    pub fn includes_directories(self) -> bool {
        matches!(self, Self::Directories | Self::Both)
    }

    pub fn includes_search(self) -> bool {
        matches!(self, Self::Google | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directories => "directories",
            Self::Google => "google",
            Self::Both => "both",
        }
    }
}

impl FromStr for SourceMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "directories" => Ok(Self::Directories),
            "google" => Ok(Self::Google),
            "both" => Ok(Self::Both),
            _ => Err(ConfigurationError::InvalidSourceMode(s.to_string())),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
