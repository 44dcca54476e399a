use serde::{Deserialize, Serialize};

/// A ticker that could not be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub reason: String,
}

/// Outcome of one ingestion run.
///
/// A failed ticker does not abort the run; its key keeps the fixings it
/// had before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Currency fixings stored by this run; in-batch duplicates count once.
    pub currency_fixings: usize,
    /// Asset fixings stored by this run.
    pub asset_fixings: usize,
    pub failures: Vec<TickerFailure>,
}

impl IngestionReport {
    pub fn written(&self) -> usize {
        self.currency_fixings + self.asset_fixings
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
