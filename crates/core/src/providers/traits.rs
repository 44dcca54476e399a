use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::fixing::ClosePoint;

/// A source of daily closing values keyed by a feed ticker.
///
/// Currency tickers (e.g., "EURUSD=X") close at the value of one unit in
/// the base currency; asset tickers (ISINs) close in the asset's own
/// currency. Feeds know nothing about the catalog; ingestion maps tickers
/// back to currencies and assets.
#[async_trait]
pub trait FixingFeed: Send + Sync {
    /// Human-readable name of this feed (for logs/errors).
    fn name(&self) -> &str;

    /// Whether this feed can quote `ticker`.
    fn supports(&self, ticker: &str) -> bool;

    /// Daily closes for `ticker` with `from <= date <= to`, sorted by date.
    async fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError>;
}
