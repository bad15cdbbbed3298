//! Supported content locales.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// A content locale. Every localized entity lives in one table per locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Pl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pl];
    pub const DEFAULT: Locale = Locale::En;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pl => "pl",
        }
    }

    /// Value for the HTML `lang` / `og:locale` attributes.
    #[must_use]
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::En => "en-US",
            Locale::Pl => "pl-PL",
        }
    }

    /// The other locale, used for alternate links.
    #[must_use]
    pub fn alternate(self) -> Locale {
        match self {
            Locale::En => Locale::Pl,
            Locale::Pl => Locale::En,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "pl" => Ok(Locale::Pl),
            other => Err(ValidationError::InvalidField {
                field: "locale".to_string(),
                message: format!("unsupported locale '{other}'"),
            }),
        }
    }
}
