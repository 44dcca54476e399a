use serde::{Deserialize, Serialize};

/// A currency known to the system.
///
/// **Equality and hashing** are based solely on `code`; the display symbol
/// and feed ticker are administrative metadata that may be edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    /// ISO-like code, uppercased (e.g., "USD", "EUR", "RUB")
    pub code: String,

    /// Display symbol (e.g., "$", "€", "₽")
    pub symbol: String,

    /// External feed ticker quoting one unit in the base currency (e.g., "EURUSD=X")
    pub ticker: String,
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Currency {}

impl std::hash::Hash for Currency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl Currency {
    /// Create a currency whose ticker follows the `{ISO}USD=X` feed convention.
    pub fn new(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        let code = normalize_code(&code.into());
        let ticker = format!("{code}USD=X");
        Self {
            code,
            symbol: symbol.into(),
            ticker,
        }
    }

    /// Create a currency with an explicit feed ticker.
    pub fn with_ticker(
        code: impl Into<String>,
        symbol: impl Into<String>,
        ticker: impl Into<String>,
    ) -> Self {
        Self {
            code: normalize_code(&code.into()),
            symbol: symbol.into(),
            ticker: ticker.into(),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Trim and uppercase a currency code so lookups are case-insensitive.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
