use crate::constants::defaults;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a multi-link query selects documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A document matches if it carries at least one requested link.
    #[default]
    Any,
    /// A document matches only if it carries every requested link.
    All,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(format!("unknown match mode '{other}', expected 'any' or 'all'")),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::All => f.write_str("all"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Name reported by the service description.
    ///
    /// Defaults to `aas-discovery`.
    pub name: String,
    pub match_mode: MatchMode,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            name: defaults::SERVICE_NAME.to_string(),
            match_mode: MatchMode::Any,
        }
    }
}
