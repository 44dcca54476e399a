use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::fixing::ClosePoint;

use super::traits::FixingFeed;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER: &str = "Frankfurter";

/// Frankfurter API feed for fiat currency fixings.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) data.
/// - **Coverage**: ~30 currencies, business days only.
///
/// Quotes `{ISO}{quote}=X` tickers, where `quote` is the base currency the
/// feed was built for: the close is the value of one `ISO` unit in `quote`.
pub struct FrankfurterFeed {
    client: Client,
    quote_currency: String,
}

impl FrankfurterFeed {
    pub fn new(quote_currency: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            quote_currency: quote_currency.trim().to_uppercase(),
        }
    }

    /// The ISO code quoted by `ticker`, if it has the `{ISO}{quote}=X` shape.
    fn parse_ticker<'t>(&self, ticker: &'t str) -> Option<&'t str> {
        let pair = ticker.strip_suffix("=X")?;
        let iso = pair.strip_suffix(self.quote_currency.as_str())?;
        (iso.len() == 3 && iso.chars().all(|c| c.is_ascii_uppercase())).then_some(iso)
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    rates: HashMap<String, HashMap<String, f64>>,
}

#[async_trait]
impl FixingFeed for FrankfurterFeed {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, ticker: &str) -> bool {
        self.parse_ticker(ticker).is_some()
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError> {
        let base = self.parse_ticker(ticker).ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Unsupported ticker {ticker}"),
        })?;
        let target = &self.quote_currency;

        let from_str = from.format("%Y-%m-%d");
        let to_str = to.format("%Y-%m-%d");
        let url = format!("{BASE_URL}/{from_str}..{to_str}?base={base}&symbols={target}");

        let resp: TimeSeriesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse time series for {base}/{target}: {e}"),
            })?;

        let mut points: Vec<ClosePoint> = resp
            .rates
            .iter()
            .filter_map(|(date_str, rates)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                let close = Decimal::from_f64(*rates.get(target)?)?;
                Some(ClosePoint { date, close })
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
