use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for the entire market-vision-core library.
/// Every public function returns `Result<T, CoreError>`.
///
/// Missing fixing data is deliberately *not* an error: the engine models it
/// as `None` and the report layer as an incomplete `Valuation`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Reference data ──────────────────────────────────────────────
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Asset {0} has no home currency")]
    NoHomeCurrency(String),

    #[error("Asset {asset} is referenced by {holdings} holding(s) and cannot be removed")]
    AssetInUse { asset: String, holdings: usize },

    #[error("Currency {currency} cannot be removed: {reason}")]
    CurrencyInUse { currency: String, reason: String },

    // ── Portfolios ──────────────────────────────────────────────────
    #[error("Invalid holding: {0}")]
    InvalidHolding(String),

    #[error("Portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Fixing series ───────────────────────────────────────────────
    #[error("Fixing for {key} on {date} already exists")]
    DuplicateFixing { key: String, date: NaiveDate },

    #[error("Fixing write aborted, series left unchanged: {0}")]
    IngestionTransaction(String),

    // ── Market-data feeds ───────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No feed available for ticker: {0}")]
    NoFeed(String),

    // ── Snapshot storage ────────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),
}

impl CoreError {
    /// Errors caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownCurrency(_)
                | CoreError::UnknownAsset(_)
                | CoreError::NoHomeCurrency(_)
                | CoreError::AssetInUse { .. }
                | CoreError::CurrencyInUse { .. }
                | CoreError::InvalidHolding(_)
                | CoreError::PortfolioNotFound(_)
                | CoreError::HoldingNotFound(_)
                | CoreError::ValidationError(_)
                | CoreError::DuplicateFixing { .. }
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often carry the full URL; drop the query string
        // so feed credentials never end up in logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
