use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::fixing::{AssetFixing, CurrencyFixing, FixingBatch, WriteCount};

use super::traits::FixingSeries;

/// Close value and denomination of one asset fixing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Close {
    value: Decimal,
    currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesKind {
    Currency,
    Asset,
}

#[derive(Debug, Clone, Default)]
struct SeriesIndex {
    /// currency code → date → value in base
    currencies: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
    /// asset name → date → close
    assets: HashMap<String, BTreeMap<NaiveDate, Close>>,
}

/// In-memory fixing series, append-only apart from full refreshes.
///
/// One `BTreeMap` per key gives O(log n) as-of lookups via `range(..=date)`
/// and makes "one fixing per (key, date)" structural.
///
/// Write policy for duplicates:
/// - `record_*` rejects a (key, date) that already exists.
/// - Batch writes let the later entry of the batch win and log the collision.
#[derive(Debug, Clone)]
pub struct MemoryFixingStore {
    base_currency: String,
    index: SeriesIndex,
}

impl MemoryFixingStore {
    pub fn new(base_currency: &str) -> Self {
        Self {
            base_currency: base_currency.trim().to_uppercase(),
            index: SeriesIndex::default(),
        }
    }

    /// Build a store from flat fixing lists (e.g., a loaded snapshot).
    pub fn from_fixings(
        base_currency: &str,
        currency_fixings: Vec<CurrencyFixing>,
        asset_fixings: Vec<AssetFixing>,
    ) -> Result<Self, CoreError> {
        let mut store = Self::new(base_currency);
        store.replace_all(FixingBatch {
            currency_fixings,
            asset_fixings,
        })?;
        Ok(store)
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    // ── Single writes ───────────────────────────────────────────────

    /// Record one currency fixing. Fixings are immutable, so an existing
    /// (currency, date) is rejected.
    pub fn record_currency_fixing(&mut self, fixing: CurrencyFixing) -> Result<(), CoreError> {
        self.check_currency_fixing(&fixing)
            .map_err(CoreError::ValidationError)?;
        let series = self.index.currencies.entry(fixing.currency.clone()).or_default();
        if series.contains_key(&fixing.date) {
            return Err(CoreError::DuplicateFixing {
                key: fixing.currency,
                date: fixing.date,
            });
        }
        series.insert(fixing.date, fixing.value_in_base);
        Ok(())
    }

    /// Record one asset fixing; an existing (asset, date) is rejected.
    pub fn record_asset_fixing(&mut self, fixing: AssetFixing) -> Result<(), CoreError> {
        Self::check_asset_fixing(&fixing).map_err(CoreError::ValidationError)?;
        let series = self.index.assets.entry(fixing.asset.clone()).or_default();
        if series.contains_key(&fixing.date) {
            return Err(CoreError::DuplicateFixing {
                key: fixing.asset,
                date: fixing.date,
            });
        }
        series.insert(
            fixing.date,
            Close {
                value: fixing.close,
                currency: fixing.currency,
            },
        );
        Ok(())
    }

    // ── Batch writes ────────────────────────────────────────────────

    /// Replace the whole series with `batch`.
    ///
    /// The new index is built aside and swapped in only once the entire
    /// batch is valid, so readers never observe a partial refresh and a
    /// failure leaves the previous series intact.
    pub fn replace_all(&mut self, batch: FixingBatch) -> Result<WriteCount, CoreError> {
        self.validate_batch(&batch)?;

        let mut index = SeriesIndex::default();
        let written = Self::merge_into(&mut index, batch, |_, _, _| true);

        self.index = index;
        debug!(written = written.total(), "fixing series replaced");
        Ok(written)
    }

    /// Append fixings dated strictly after each key's last stored fixing.
    /// Older entries are skipped. All-or-nothing: an invalid entry aborts
    /// the whole batch. Returns the number of fixings written.
    pub fn append(&mut self, batch: FixingBatch) -> Result<WriteCount, CoreError> {
        self.validate_batch(&batch)?;

        let last_currency: HashMap<String, NaiveDate> = self
            .index
            .currencies
            .iter()
            .filter_map(|(k, s)| s.keys().next_back().map(|d| (k.clone(), *d)))
            .collect();
        let last_asset: HashMap<String, NaiveDate> = self
            .index
            .assets
            .iter()
            .filter_map(|(k, s)| s.keys().next_back().map(|d| (k.clone(), *d)))
            .collect();

        let submitted = batch.len();
        let written = Self::merge_into(&mut self.index, batch, |kind, key, date| {
            let last = match kind {
                SeriesKind::Currency => last_currency.get(key),
                SeriesKind::Asset => last_asset.get(key),
            };
            last.map_or(true, |last| date > *last)
        });

        debug!(
            written = written.total(),
            skipped = submitted - written.total(),
            "fixings appended"
        );
        Ok(written)
    }

    /// Insert batch entries accepted by `keep`, the later entry winning on a
    /// (key, date) collision within the batch. Returns the number inserted.
    fn merge_into(
        index: &mut SeriesIndex,
        batch: FixingBatch,
        keep: impl Fn(SeriesKind, &str, NaiveDate) -> bool,
    ) -> WriteCount {
        let mut written = WriteCount::default();
        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();

        for f in batch.currency_fixings {
            if !keep(SeriesKind::Currency, &f.currency, f.date) {
                continue;
            }
            if seen.insert((f.currency.clone(), f.date)) {
                written.currency_fixings += 1;
            } else {
                warn!(currency = %f.currency, date = %f.date, "duplicate currency fixing in batch, keeping the later one");
            }
            index
                .currencies
                .entry(f.currency)
                .or_default()
                .insert(f.date, f.value_in_base);
        }

        seen.clear();
        for f in batch.asset_fixings {
            if !keep(SeriesKind::Asset, &f.asset, f.date) {
                continue;
            }
            if seen.insert((f.asset.clone(), f.date)) {
                written.asset_fixings += 1;
            } else {
                warn!(asset = %f.asset, date = %f.date, "duplicate asset fixing in batch, keeping the later one");
            }
            index.assets.entry(f.asset).or_default().insert(
                f.date,
                Close {
                    value: f.close,
                    currency: f.currency,
                },
            );
        }
        written
    }

    fn validate_batch(&self, batch: &FixingBatch) -> Result<(), CoreError> {
        for f in &batch.currency_fixings {
            self.check_currency_fixing(f)
                .map_err(CoreError::IngestionTransaction)?;
        }
        for f in &batch.asset_fixings {
            Self::check_asset_fixing(f).map_err(CoreError::IngestionTransaction)?;
        }
        Ok(())
    }

    fn check_currency_fixing(&self, f: &CurrencyFixing) -> Result<(), String> {
        if f.currency == self.base_currency {
            return Err(format!(
                "base currency {} has an implicit fixing of 1 and cannot be stored",
                self.base_currency
            ));
        }
        if f.value_in_base <= Decimal::ZERO {
            return Err(format!(
                "fixing for {} on {} must be positive, got {}",
                f.currency, f.date, f.value_in_base
            ));
        }
        Ok(())
    }

    fn check_asset_fixing(f: &AssetFixing) -> Result<(), String> {
        if f.currency.is_empty() {
            return Err(format!(
                "fixing for {} on {} has no denomination currency",
                f.asset, f.date
            ));
        }
        if f.close < Decimal::ZERO {
            return Err(format!(
                "close for {} on {} must not be negative, got {}",
                f.asset, f.date, f.close
            ));
        }
        Ok(())
    }

    // ── Removal (catalog cascades) ──────────────────────────────────

    /// Drop every fixing of a currency. Returns the number removed.
    pub fn remove_currency(&mut self, currency: &str) -> usize {
        self.index
            .currencies
            .remove(currency)
            .map_or(0, |s| s.len())
    }

    /// Drop every fixing of an asset. Returns the number removed.
    pub fn remove_asset(&mut self, asset: &str) -> usize {
        self.index.assets.remove(asset).map_or(0, |s| s.len())
    }

    /// Whether any asset fixing is denominated in `currency`.
    pub fn has_asset_fixings_in(&self, currency: &str) -> bool {
        self.index
            .assets
            .values()
            .any(|s| s.values().any(|c| c.currency == currency))
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn last_currency_fixing_date(&self, currency: &str) -> Option<NaiveDate> {
        self.index
            .currencies
            .get(currency)
            .and_then(|s| s.keys().next_back().copied())
    }

    pub fn last_asset_fixing_date(&self, asset: &str) -> Option<NaiveDate> {
        self.index
            .assets
            .get(asset)
            .and_then(|s| s.keys().next_back().copied())
    }

    /// Flatten the currency series, sorted by (currency, date).
    pub fn currency_fixings(&self) -> Vec<CurrencyFixing> {
        let mut out: Vec<CurrencyFixing> = self
            .index
            .currencies
            .iter()
            .flat_map(|(code, s)| {
                s.iter()
                    .map(|(date, value)| CurrencyFixing::new(code.clone(), *date, *value))
            })
            .collect();
        out.sort_by(|a, b| (&a.currency, a.date).cmp(&(&b.currency, b.date)));
        out
    }

    /// Flatten the asset series, sorted by (asset, date).
    pub fn asset_fixings(&self) -> Vec<AssetFixing> {
        let mut out: Vec<AssetFixing> = self
            .index
            .assets
            .iter()
            .flat_map(|(name, s)| {
                s.iter().map(|(date, c)| {
                    AssetFixing::new(name.clone(), *date, c.value, c.currency.clone())
                })
            })
            .collect();
        out.sort_by(|a, b| (&a.asset, a.date).cmp(&(&b.asset, b.date)));
        out
    }

    /// Total number of stored fixings across both series.
    pub fn len(&self) -> usize {
        self.index.currencies.values().map(|s| s.len()).sum::<usize>()
            + self.index.assets.values().map(|s| s.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FixingSeries for MemoryFixingStore {
    fn latest_currency_fixing_as_of(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Option<CurrencyFixing> {
        self.index
            .currencies
            .get(currency)?
            .range(..=date)
            .next_back()
            .map(|(d, v)| CurrencyFixing::new(currency, *d, *v))
    }

    fn currency_fixing_on(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        self.index.currencies.get(currency)?.get(&date).copied()
    }

    fn latest_asset_fixing_as_of(&self, asset: &str, date: NaiveDate) -> Option<AssetFixing> {
        self.index
            .assets
            .get(asset)?
            .range(..=date)
            .next_back()
            .map(|(d, c)| AssetFixing::new(asset, *d, c.value, c.currency.clone()))
    }
}
