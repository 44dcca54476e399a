pub mod errors;
pub mod models;
pub mod providers;
pub mod series;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use errors::CoreError;
use models::{
    asset::Asset,
    catalog::Catalog,
    currency::{normalize_code, Currency},
    fixing::{AssetFixing, CurrencyFixing},
    ingestion::IngestionReport,
    portfolio::Portfolio,
    report::{AssetListing, CurrencyListing, PortfolioCard, PortfolioListing, ValuePoint},
    settings::Settings,
    snapshot::MarketSnapshot,
    valuation::Valuation,
};
use providers::registry::FeedRegistry;
use series::memory::MemoryFixingStore;
use services::{
    context::ValuationContext, history_service::HistoryService,
    ingestion_service::IngestionService, portfolio_service::PortfolioService,
    report_service::ReportService,
};
use storage::manager::StorageManager;

/// Main entry point for the Market Vision core library.
/// Holds the catalog, the fixing series, the portfolios and all services
/// needed to value them. "Today" is always passed in by the caller.
#[must_use]
pub struct MarketVision {
    settings: Settings,
    catalog: Catalog,
    store: MemoryFixingStore,
    portfolios: Vec<Portfolio>,
    portfolio_service: PortfolioService,
    report_service: ReportService,
    history_service: HistoryService,
    ingestion_service: IngestionService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for MarketVision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketVision")
            .field("settings", &self.settings)
            .field("currencies", &self.catalog.currencies().count())
            .field("assets", &self.catalog.assets().count())
            .field("fixings", &self.store.len())
            .field("portfolios", &self.portfolios.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl MarketVision {
    /// Create an empty engine with default settings and the default feeds.
    pub fn create_new() -> Self {
        let snapshot = MarketSnapshot::default();
        let registry = FeedRegistry::new_with_defaults(&snapshot.settings.base_currency);
        Self::build(snapshot, registry)
    }

    /// Create an empty engine with the given settings and the default feeds.
    pub fn with_settings(settings: Settings) -> Result<Self, CoreError> {
        let registry = FeedRegistry::new_with_defaults(&settings.base_currency);
        Self::with_registry(settings, registry)
    }

    /// Create an empty engine with custom feeds (e.g., offline or mocked).
    pub fn with_registry(mut settings: Settings, registry: FeedRegistry) -> Result<Self, CoreError> {
        settings.validate()?;
        let snapshot = MarketSnapshot {
            settings,
            ..MarketSnapshot::default()
        };
        Self::from_snapshot(snapshot, registry)
    }

    /// Rebuild an engine from a snapshot, re-validating every fixing.
    pub fn from_snapshot(
        mut snapshot: MarketSnapshot,
        registry: FeedRegistry,
    ) -> Result<Self, CoreError> {
        snapshot.settings.validate()?;
        let store = MemoryFixingStore::from_fixings(
            &snapshot.settings.base_currency,
            std::mem::take(&mut snapshot.currency_fixings),
            std::mem::take(&mut snapshot.asset_fixings),
        )?;
        Ok(Self::assemble(snapshot, store, registry))
    }

    fn build(snapshot: MarketSnapshot, registry: FeedRegistry) -> Self {
        let store = MemoryFixingStore::new(&snapshot.settings.base_currency);
        Self::assemble(snapshot, store, registry)
    }

    fn assemble(snapshot: MarketSnapshot, store: MemoryFixingStore, registry: FeedRegistry) -> Self {
        let settings = snapshot.settings;
        Self {
            portfolio_service: PortfolioService::new(),
            report_service: ReportService::new(&settings),
            history_service: HistoryService::new(&settings.base_currency, settings.display_scale),
            ingestion_service: IngestionService::new(registry),
            catalog: snapshot.catalog,
            portfolios: snapshot.portfolios,
            store,
            settings,
            dirty: false,
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Everything needed to restore this engine.
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            settings: self.settings.clone(),
            catalog: self.catalog.clone(),
            currency_fixings: self.store.currency_fixings(),
            asset_fixings: self.store.asset_fixings(),
            portfolios: self.portfolios.clone(),
        }
    }

    /// Load an engine from snapshot bytes, with the default feeds.
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, CoreError> {
        let snapshot = StorageManager::load_from_bytes(data)?;
        let registry = FeedRegistry::new_with_defaults(&snapshot.settings.base_currency);
        Self::from_snapshot(snapshot, registry)
    }

    /// Save the current state to snapshot bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, CoreError> {
        let bytes = StorageManager::save_to_bytes(&self.snapshot())?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load an engine from a snapshot file, with the default feeds.
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let snapshot = StorageManager::load_from_file(path)?;
        let registry = FeedRegistry::new_with_defaults(&snapshot.settings.base_currency);
        Self::from_snapshot(snapshot, registry)
    }

    /// Save to a snapshot file on disk.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_file(&mut self, path: &str) -> Result<(), CoreError> {
        StorageManager::save_to_file(&self.snapshot(), path)?;
        self.dirty = false;
        Ok(())
    }

    /// Returns `true` if anything has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn store(&self) -> &MemoryFixingStore {
        &self.store
    }

    /// Read-only valuation context as of `today`.
    pub fn context(&self, today: NaiveDate) -> ValuationContext<'_> {
        ValuationContext::new(&self.store, &self.catalog, today)
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Value of one unit of `from` in `to` as of `date`.
    /// `Ok(None)` when a required fixing is missing.
    pub fn rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Option<Decimal>, CoreError> {
        let converter = self.converter();
        let from = converter.resolve(&self.catalog, from)?;
        let to = converter.resolve(&self.catalog, to)?;
        Ok(converter.rate(&self.store, &from, &to, date))
    }

    /// Convert `amount` of `from` into `to` as of `date`.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        Ok(self
            .rate(from, to, date)?
            .and_then(|rate| rate.checked_mul(amount)))
    }

    /// Trailing dynamic of `currency` priced in `target`, over the
    /// configured window ending `today`.
    pub fn currency_dynamic(
        &self,
        currency: &str,
        target: &str,
        today: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        let converter = self.converter();
        let currency = converter.resolve(&self.catalog, currency)?;
        let target = converter.resolve(&self.catalog, target)?;
        Ok(converter.dynamic(
            &self.store,
            &currency,
            &target,
            self.settings.dynamic_window_days,
            today,
        ))
    }

    /// Unit price of `asset` in `target` (default: home currency) as of
    /// `date` (default: `today`).
    pub fn asset_price(
        &self,
        asset: &str,
        target: Option<&str>,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        let asset = self.catalog.asset(asset)?;
        self.report_service
            .aggregator()
            .holding_valuer()
            .asset_valuer()
            .price(&self.context(today), asset, target, date)
    }

    /// Trailing dynamic of `asset` over the configured window ending `today`.
    pub fn asset_dynamic(
        &self,
        asset: &str,
        target: Option<&str>,
        today: NaiveDate,
    ) -> Result<Option<Decimal>, CoreError> {
        let asset = self.catalog.asset(asset)?;
        self.report_service
            .aggregator()
            .holding_valuer()
            .asset_valuer()
            .dynamic(
                &self.context(today),
                asset,
                self.settings.dynamic_window_days,
                target,
            )
    }

    /// Current value of a portfolio in `target`.
    pub fn portfolio_value(
        &self,
        portfolio_id: Uuid,
        target: &str,
        today: NaiveDate,
    ) -> Result<Valuation, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        let target = self.converter().resolve(&self.catalog, target)?;
        self.report_service
            .aggregator()
            .current_value(&self.context(today), portfolio, &target)
    }

    /// Percentage change of a portfolio since its holdings were acquired.
    pub fn portfolio_dynamic(
        &self,
        portfolio_id: Uuid,
        target: &str,
        today: NaiveDate,
    ) -> Result<Valuation, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        let target = self.converter().resolve(&self.catalog, target)?;
        self.report_service
            .aggregator()
            .dynamic_from_acquisition(&self.context(today), portfolio, &target)
    }

    fn converter(&self) -> &services::currency_converter::CurrencyConverter {
        self.report_service
            .aggregator()
            .holding_valuer()
            .asset_valuer()
            .converter()
    }

    // ── Reports ─────────────────────────────────────────────────────

    pub fn currency_list(
        &self,
        target: &str,
        today: NaiveDate,
    ) -> Result<Vec<CurrencyListing>, CoreError> {
        self.report_service
            .currency_list(&self.context(today), target)
    }

    pub fn asset_list(&self, target: &str, today: NaiveDate) -> Result<Vec<AssetListing>, CoreError> {
        self.report_service.asset_list(&self.context(today), target)
    }

    pub fn portfolio_card(
        &self,
        portfolio_id: Uuid,
        target: &str,
        today: NaiveDate,
    ) -> Result<PortfolioCard, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        self.report_service
            .portfolio_card(&self.context(today), portfolio, target)
    }

    /// Compact rows for every portfolio of `owner`.
    pub fn portfolio_list(
        &self,
        owner: &str,
        target: &str,
        today: NaiveDate,
    ) -> Result<Vec<PortfolioListing>, CoreError> {
        self.report_service
            .portfolio_list(&self.context(today), self.portfolios_for(owner), target)
    }

    /// Portfolio value every `step_days` between `from` and `to`.
    pub fn portfolio_history(
        &self,
        portfolio_id: Uuid,
        target: &str,
        from: NaiveDate,
        to: NaiveDate,
        step_days: u64,
        today: NaiveDate,
    ) -> Result<Vec<ValuePoint>, CoreError> {
        let portfolio = self.portfolio(portfolio_id)?;
        self.history_service.portfolio_history(
            &self.context(today),
            portfolio,
            target,
            from,
            to,
            step_days,
        )
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Register a currency quoted by the `{ISO}{base}=X` feed ticker.
    pub fn add_currency(&mut self, code: &str, symbol: &str) -> Result<(), CoreError> {
        let code = normalize_code(code);
        let ticker = format!("{code}{}=X", self.settings.base_currency);
        self.catalog
            .add_currency(Currency::with_ticker(code, symbol, ticker))?;
        self.dirty = true;
        Ok(())
    }

    /// Register an asset denominated in an existing catalog currency.
    pub fn add_asset(&mut self, name: &str, isin: &str, home_currency: &str) -> Result<(), CoreError> {
        self.catalog.add_asset(Asset::new(name, isin, home_currency))?;
        self.dirty = true;
        Ok(())
    }

    /// Remove an asset and its fixings. Fails while any holding references it.
    pub fn remove_asset(&mut self, name: &str) -> Result<Asset, CoreError> {
        self.catalog.asset(name)?;
        let holdings: usize = self.portfolios.iter().map(|p| p.holdings_of(name)).sum();
        if holdings > 0 {
            return Err(CoreError::AssetInUse {
                asset: name.to_string(),
                holdings,
            });
        }

        let asset = self.catalog.remove_asset(name)?;
        let fixings = self.store.remove_asset(name);
        info!(asset = %name, fixings, "asset removed");
        self.dirty = true;
        Ok(asset)
    }

    /// Remove a currency and its fixings. The base currency, and any
    /// currency asset fixings are denominated in, cannot be removed.
    /// Assets homed in it lose their home currency.
    pub fn remove_currency(&mut self, code: &str) -> Result<Currency, CoreError> {
        let code = normalize_code(code);
        self.catalog.currency(&code)?;
        if code == self.settings.base_currency {
            return Err(CoreError::CurrencyInUse {
                currency: code,
                reason: "it is the base currency".into(),
            });
        }
        if self.store.has_asset_fixings_in(&code) {
            return Err(CoreError::CurrencyInUse {
                currency: code,
                reason: "asset fixings are denominated in it".into(),
            });
        }

        let (currency, detached) = self.catalog.remove_currency(&code)?;
        let fixings = self.store.remove_currency(&code);
        info!(currency = %code, fixings, detached, "currency removed");
        self.dirty = true;
        Ok(currency)
    }

    /// Seed currencies from a JSON document. Returns the number created.
    pub fn seed_currencies(&mut self, json: &str) -> Result<usize, CoreError> {
        let created = self
            .catalog
            .seed_currencies_from_json(json, &self.settings.base_currency)?;
        if created > 0 {
            self.dirty = true;
        }
        Ok(created)
    }

    /// Seed assets from a JSON document. Returns the number created.
    pub fn seed_assets(&mut self, json: &str) -> Result<usize, CoreError> {
        let created = self.catalog.seed_assets_from_json(json)?;
        if created > 0 {
            self.dirty = true;
        }
        Ok(created)
    }

    // ── Fixings ─────────────────────────────────────────────────────

    /// Record a single currency fixing (manual entry).
    pub fn record_currency_fixing(
        &mut self,
        currency: &str,
        date: NaiveDate,
        value_in_base: Decimal,
    ) -> Result<(), CoreError> {
        let code = normalize_code(currency);
        self.catalog.currency(&code)?;
        self.store
            .record_currency_fixing(CurrencyFixing::new(code, date, value_in_base))?;
        self.dirty = true;
        Ok(())
    }

    /// Record a single asset close, denominated in the asset's home currency.
    pub fn record_asset_fixing(
        &mut self,
        asset: &str,
        date: NaiveDate,
        close: Decimal,
    ) -> Result<(), CoreError> {
        let asset = self.catalog.asset(asset)?;
        let currency = asset
            .home_currency()
            .ok_or_else(|| CoreError::NoHomeCurrency(asset.name.clone()))?;
        let fixing = AssetFixing::new(asset.name.clone(), date, close, currency);
        self.store.record_asset_fixing(fixing)?;
        self.dirty = true;
        Ok(())
    }

    // ── Ingestion ───────────────────────────────────────────────────

    /// Re-download every series and replace the stored fixings.
    pub async fn refresh_all(&mut self, today: NaiveDate) -> Result<IngestionReport, CoreError> {
        let report = self
            .ingestion_service
            .full_refresh(&self.settings, &self.catalog, &mut self.store, today)
            .await?;
        self.dirty = true;
        Ok(report)
    }

    /// Download only the fixings newer than what is stored.
    pub async fn update_recent(&mut self, today: NaiveDate) -> Result<IngestionReport, CoreError> {
        let report = self
            .ingestion_service
            .incremental_update(&self.settings, &self.catalog, &mut self.store, today)
            .await?;
        if report.written() > 0 {
            self.dirty = true;
        }
        Ok(report)
    }

    // ── Portfolios ──────────────────────────────────────────────────

    pub fn create_portfolio(&mut self, owner: &str, name: &str) -> Result<Uuid, CoreError> {
        let portfolio = self.portfolio_service.create_portfolio(owner, name)?;
        let id = portfolio.id;
        self.portfolios.push(portfolio);
        self.dirty = true;
        Ok(id)
    }

    pub fn rename_portfolio(&mut self, portfolio_id: Uuid, name: &str) -> Result<(), CoreError> {
        let portfolio = Self::find_mut(&mut self.portfolios, portfolio_id)?;
        self.portfolio_service.rename_portfolio(portfolio, name)?;
        self.dirty = true;
        Ok(())
    }

    /// Delete a portfolio with all its holdings.
    pub fn delete_portfolio(&mut self, portfolio_id: Uuid) -> Result<Portfolio, CoreError> {
        let idx = self
            .portfolios
            .iter()
            .position(|p| p.id == portfolio_id)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))?;
        self.dirty = true;
        Ok(self.portfolios.remove(idx))
    }

    pub fn portfolio(&self, portfolio_id: Uuid) -> Result<&Portfolio, CoreError> {
        self.portfolios
            .iter()
            .find(|p| p.id == portfolio_id)
            .ok_or_else(|| CoreError::PortfolioNotFound(portfolio_id.to_string()))
    }

    #[must_use]
    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    /// Portfolios recorded for `owner`.
    pub fn portfolios_for<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Portfolio> {
        self.portfolios.iter().filter(move |p| p.owner == owner)
    }

    /// Add a holding. The asset must exist, the quantity must be non-zero
    /// and the acquisition date must not be after `today`.
    pub fn add_holding(
        &mut self,
        portfolio_id: Uuid,
        asset: &str,
        quantity: i64,
        acquisition_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Uuid, CoreError> {
        let portfolio = Self::find_mut(&mut self.portfolios, portfolio_id)?;
        let id = self.portfolio_service.add_holding(
            portfolio,
            &self.catalog,
            asset,
            quantity,
            acquisition_date,
            today,
        )?;
        self.dirty = true;
        Ok(id)
    }

    pub fn remove_holding(&mut self, portfolio_id: Uuid, holding_id: Uuid) -> Result<(), CoreError> {
        let portfolio = Self::find_mut(&mut self.portfolios, portfolio_id)?;
        self.portfolio_service
            .remove_holding(portfolio, holding_id)?;
        self.dirty = true;
        Ok(())
    }

    fn find_mut(portfolios: &mut [Portfolio], id: Uuid) -> Result<&mut Portfolio, CoreError> {
        portfolios
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::PortfolioNotFound(id.to_string()))
    }
}
