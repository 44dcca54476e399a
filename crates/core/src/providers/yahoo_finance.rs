use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::errors::CoreError;
use crate::models::fixing::ClosePoint;

use super::traits::FixingFeed;

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance feed for daily closes.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices, and `{ISO}USD=X` FX pairs.
///
/// Uses the `yahoo_finance_api` crate. Closes arrive as `f64` and are
/// converted to `Decimal`; non-finite closes are dropped.
pub struct YahooFinanceFeed {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceFeed {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let invalid = |e: String| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid date {date}: {e}"),
        };

        let month = time::Month::try_from(date.month() as u8).map_err(|e| invalid(e.to_string()))?;
        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| invalid(e.to_string()))?
            .with_hms(0, 0, 0)
            .map_err(|e| invalid(e.to_string()))?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl FixingFeed for YahooFinanceFeed {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, ticker: &str) -> bool {
        !ticker.trim().is_empty()
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch history for {ticker}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quotes for {ticker}: {e}"),
        })?;

        let points = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                let close = Decimal::from_f64(q.close)?;
                (date >= from && date <= to).then_some(ClosePoint { date, close })
            })
            .collect();

        Ok(points)
    }
}
