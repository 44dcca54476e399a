use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Value of one unit of `currency` in the base currency on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFixing {
    pub currency: String,
    pub date: NaiveDate,
    pub value_in_base: Decimal,
}

impl CurrencyFixing {
    pub fn new(currency: impl Into<String>, date: NaiveDate, value_in_base: Decimal) -> Self {
        Self {
            currency: currency.into().trim().to_uppercase(),
            date,
            value_in_base,
        }
    }
}

/// Closing price of `asset` on `date`, expressed in `currency`.
///
/// The denomination is stored per fixing so a redenominated asset keeps
/// its history valued correctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFixing {
    pub asset: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub currency: String,
}

impl AssetFixing {
    pub fn new(
        asset: impl Into<String>,
        date: NaiveDate,
        close: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            asset: asset.into(),
            date,
            close,
            currency: currency.into().trim().to_uppercase(),
        }
    }
}

/// A single daily close as delivered by a market-data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// A set of fixings written to the series in one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixingBatch {
    pub currency_fixings: Vec<CurrencyFixing>,
    pub asset_fixings: Vec<AssetFixing>,
}

impl FixingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.currency_fixings.is_empty() && self.asset_fixings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.currency_fixings.len() + self.asset_fixings.len()
    }
}

/// Fixings a batch write actually stored, after in-batch duplicates and
/// skipped entries are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCount {
    pub currency_fixings: usize,
    pub asset_fixings: usize,
}

impl WriteCount {
    pub fn total(&self) -> usize {
        self.currency_fixings + self.asset_fixings
    }
}
