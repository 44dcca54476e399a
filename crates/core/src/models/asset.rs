use serde::{Deserialize, Serialize};

use super::currency::normalize_code;

/// A tradable security (an "index" in the market-data feed's vocabulary).
///
/// **Equality and hashing** are based solely on `name`, which is unique
/// across the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique display name (e.g., "ACME Corp")
    pub name: String,

    /// External identifier used as the feed ticker (ISIN-like string)
    pub isin: String,

    /// Currency the asset is denominated in. `None` once the referenced
    /// currency has been removed from the catalog.
    pub home_currency: Option<String>,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Asset {
    pub fn new(
        name: impl Into<String>,
        isin: impl Into<String>,
        home_currency: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            isin: isin.into().trim().to_string(),
            home_currency: Some(normalize_code(&home_currency.into())),
        }
    }

    /// Home currency code, if the asset still has one.
    pub fn home_currency(&self) -> Option<&str> {
        self.home_currency.as_deref()
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
