use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::errors::CoreError;

use super::asset::Asset;
use super::currency::{normalize_code, Currency};

/// Reference data: every currency and asset the system knows about.
///
/// Currencies are keyed by code and assets by name; both keys are unique.
/// `BTreeMap` keeps listings in a deterministic, sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    currencies: BTreeMap<String, Currency>,
    assets: BTreeMap<String, Asset>,
}

// ── Seed documents ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct CurrencySeedFile {
    #[serde(default)]
    currencies: Vec<CurrencySeed>,
}

#[derive(Deserialize)]
struct CurrencySeed {
    currency: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Deserialize)]
struct AssetSeedFile {
    #[serde(default)]
    indexes: Vec<AssetSeed>,
}

#[derive(Deserialize)]
struct AssetSeed {
    #[serde(rename = "indexName")]
    name: String,
    #[serde(rename = "ccyId")]
    currency: String,
    #[serde(rename = "indexISIN")]
    isin: String,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Currencies ──────────────────────────────────────────────────

    /// Register a new currency. Codes are unique.
    pub fn add_currency(&mut self, currency: Currency) -> Result<(), CoreError> {
        if currency.code.is_empty() {
            return Err(CoreError::ValidationError(
                "Currency code must not be empty".into(),
            ));
        }
        if self.currencies.contains_key(&currency.code) {
            return Err(CoreError::ValidationError(format!(
                "Currency {} already exists",
                currency.code
            )));
        }
        debug!(code = %currency.code, "currency added");
        self.currencies.insert(currency.code.clone(), currency);
        Ok(())
    }

    /// Look up a currency by code (case-insensitive).
    pub fn currency(&self, code: &str) -> Result<&Currency, CoreError> {
        let code = normalize_code(code);
        self.currencies
            .get(&code)
            .ok_or(CoreError::UnknownCurrency(code))
    }

    pub fn contains_currency(&self, code: &str) -> bool {
        self.currencies.contains_key(&normalize_code(code))
    }

    /// All currencies, sorted by code.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    pub fn currency_by_ticker(&self, ticker: &str) -> Option<&Currency> {
        self.currencies.values().find(|c| c.ticker == ticker)
    }

    /// Remove a currency and detach it from every asset homed in it.
    /// Returns the removed currency and the number of detached assets.
    pub fn remove_currency(&mut self, code: &str) -> Result<(Currency, usize), CoreError> {
        let code = normalize_code(code);
        let removed = self
            .currencies
            .remove(&code)
            .ok_or_else(|| CoreError::UnknownCurrency(code.clone()))?;

        let mut detached = 0;
        for asset in self.assets.values_mut() {
            if asset.home_currency.as_deref() == Some(code.as_str()) {
                asset.home_currency = None;
                detached += 1;
            }
        }
        if detached > 0 {
            warn!(%code, detached, "assets lost their home currency");
        }
        Ok((removed, detached))
    }

    // ── Assets ──────────────────────────────────────────────────────

    /// Register a new asset. Names are unique and the home currency, when
    /// present, must already exist.
    pub fn add_asset(&mut self, asset: Asset) -> Result<(), CoreError> {
        if asset.name.is_empty() {
            return Err(CoreError::ValidationError(
                "Asset name must not be empty".into(),
            ));
        }
        if self.assets.contains_key(&asset.name) {
            return Err(CoreError::ValidationError(format!(
                "Asset {} already exists",
                asset.name
            )));
        }
        if let Some(home) = asset.home_currency() {
            self.currency(home)?;
        }
        debug!(name = %asset.name, isin = %asset.isin, "asset added");
        self.assets.insert(asset.name.clone(), asset);
        Ok(())
    }

    pub fn asset(&self, name: &str) -> Result<&Asset, CoreError> {
        self.assets
            .get(name)
            .ok_or_else(|| CoreError::UnknownAsset(name.to_string()))
    }

    pub fn contains_asset(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    /// All assets, sorted by name.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn asset_by_isin(&self, isin: &str) -> Option<&Asset> {
        self.assets.values().find(|a| a.isin == isin)
    }

    pub fn remove_asset(&mut self, name: &str) -> Result<Asset, CoreError> {
        self.assets
            .remove(name)
            .ok_or_else(|| CoreError::UnknownAsset(name.to_string()))
    }

    // ── Seeding ─────────────────────────────────────────────────────

    /// Load currencies from a `{"currencies": [{"currency", "symbol"}]}`
    /// document. Existing codes are left untouched (get-or-create). Tickers
    /// quote each currency against `base_currency`.
    /// Returns the number of currencies created.
    pub fn seed_currencies_from_json(
        &mut self,
        json: &str,
        base_currency: &str,
    ) -> Result<usize, CoreError> {
        let file: CurrencySeedFile = serde_json::from_str(json)?;
        let mut created = 0;
        for seed in file.currencies {
            if self.contains_currency(&seed.currency) {
                continue;
            }
            let code = normalize_code(&seed.currency);
            let ticker = format!("{code}{}=X", normalize_code(base_currency));
            self.add_currency(Currency::with_ticker(code, seed.symbol, ticker))?;
            created += 1;
        }
        Ok(created)
    }

    /// Load assets from a `{"indexes": [{"indexName", "ccyId", "indexISIN"}]}`
    /// document. An unknown `ccyId` yields an asset without home currency.
    /// Returns the number of assets created.
    pub fn seed_assets_from_json(&mut self, json: &str) -> Result<usize, CoreError> {
        let file: AssetSeedFile = serde_json::from_str(json)?;
        let mut created = 0;
        for seed in file.indexes {
            if self.contains_asset(seed.name.trim()) {
                continue;
            }
            let mut asset = Asset::new(seed.name, seed.isin, seed.currency);
            if let Some(home) = asset.home_currency() {
                if !self.contains_currency(home) {
                    warn!(asset = %asset.name, currency = home, "seed references unknown currency");
                    asset.home_currency = None;
                }
            }
            self.add_asset(asset)?;
            created += 1;
        }
        Ok(created)
    }
}
