use chrono::NaiveDate;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::fixing::ClosePoint;

use super::frankfurter::FrankfurterFeed;
use super::traits::FixingFeed;
use super::yahoo_finance::YahooFinanceFeed;

/// Ordered list of market-data feeds.
///
/// Routes each ticker to the feeds that support it, in registration order,
/// falling back to the next feed when one fails.
pub struct FeedRegistry {
    feeds: Vec<Box<dyn FixingFeed>>,
}

impl FeedRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { feeds: Vec::new() }
    }

    /// Create a registry with the default feeds:
    /// Yahoo Finance first (every ticker), Frankfurter as the fallback for
    /// `{ISO}{base}=X` currency tickers.
    pub fn new_with_defaults(base_currency: &str) -> Self {
        let mut registry = Self::new();

        if let Ok(yahoo) = YahooFinanceFeed::new() {
            registry.register(Box::new(yahoo));
        }
        registry.register(Box::new(FrankfurterFeed::new(base_currency)));

        registry
    }

    /// Register a new feed at the lowest priority.
    pub fn register(&mut self, feed: Box<dyn FixingFeed>) {
        self.feeds.push(feed);
    }

    /// All feeds supporting `ticker`, in priority order.
    pub fn get_feeds_for(&self, ticker: &str) -> Vec<&dyn FixingFeed> {
        self.feeds
            .iter()
            .filter(|f| f.supports(ticker))
            .map(|f| f.as_ref())
            .collect()
    }

    pub fn feed_names(&self) -> Vec<String> {
        self.feeds.iter().map(|f| f.name().to_string()).collect()
    }

    /// Fetch daily closes for `ticker`, trying each supporting feed in turn.
    /// Returns the last feed error when every feed fails.
    pub async fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError> {
        let feeds = self.get_feeds_for(ticker);
        if feeds.is_empty() {
            return Err(CoreError::NoFeed(ticker.to_string()));
        }

        let mut last_error = None;
        for feed in &feeds {
            match feed.daily_closes(ticker, from, to).await {
                Ok(mut points) => {
                    points.retain(|p| p.date >= from && p.date <= to);
                    points.sort_by_key(|p| p.date);
                    debug!(feed = feed.name(), %ticker, points = points.len(), "closes fetched");
                    return Ok(points);
                }
                Err(e) => {
                    debug!(feed = feed.name(), %ticker, error = %e, "feed failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoFeed(ticker.to_string())))
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new()
    }
}
