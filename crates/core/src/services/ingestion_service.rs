use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::errors::CoreError;
use crate::models::catalog::Catalog;
use crate::models::fixing::{AssetFixing, CurrencyFixing, FixingBatch, WriteCount};
use crate::models::ingestion::{IngestionReport, TickerFailure};
use crate::models::settings::Settings;
use crate::providers::registry::FeedRegistry;
use crate::series::memory::MemoryFixingStore;

/// What a fetched ticker feeds into.
enum Target {
    Currency(String),
    Asset { name: String, currency: String },
}

struct Job {
    ticker: String,
    from: NaiveDate,
    target: Target,
}

/// Downloads fixings from the feeds and writes them to the series.
///
/// Tickers are fetched concurrently. A ticker that fails is reported and
/// keeps whatever fixings it already had; the rest of the run still lands.
pub struct IngestionService {
    registry: FeedRegistry,
}

impl IngestionService {
    pub fn new(registry: FeedRegistry) -> Self {
        Self { registry }
    }

    /// Re-download every series over `[history_start, today - feed_lag_days]`
    /// and replace the stored series with the result.
    #[instrument(skip_all, fields(%today))]
    pub async fn full_refresh(
        &self,
        settings: &Settings,
        catalog: &Catalog,
        store: &mut MemoryFixingStore,
        today: NaiveDate,
    ) -> Result<IngestionReport, CoreError> {
        let to = today
            .checked_sub_days(Days::new(settings.feed_lag_days))
            .unwrap_or(today);
        let (jobs, mut failures) = Self::plan(catalog, store.base_currency(), |_| {
            Some(settings.history_start)
        });

        let (mut batch, fetch_failures) = self.fetch(jobs, to).await;

        // Failed keys keep their previous series through the swap.
        let mut failed_currencies = HashSet::new();
        let mut failed_assets = HashSet::new();
        for (target, _) in &fetch_failures {
            match target {
                Target::Currency(code) => failed_currencies.insert(code.as_str()),
                Target::Asset { name, .. } => failed_assets.insert(name.as_str()),
            };
        }
        for asset in catalog.assets().filter(|a| a.home_currency().is_none()) {
            failed_assets.insert(asset.name.as_str());
        }
        let kept_currencies: Vec<CurrencyFixing> = store
            .currency_fixings()
            .into_iter()
            .filter(|f| failed_currencies.contains(f.currency.as_str()))
            .collect();
        let kept_assets: Vec<AssetFixing> = store
            .asset_fixings()
            .into_iter()
            .filter(|f| failed_assets.contains(f.asset.as_str()))
            .collect();
        let kept = WriteCount {
            currency_fixings: kept_currencies.len(),
            asset_fixings: kept_assets.len(),
        };
        batch.currency_fixings.splice(0..0, kept_currencies);
        batch.asset_fixings.splice(0..0, kept_assets);
        failures.extend(fetch_failures.into_iter().map(|(_, f)| f));

        // Kept keys and fetched keys are disjoint, so the difference is
        // what this run stored.
        let written = store.replace_all(batch)?;

        let report = IngestionReport {
            currency_fixings: written.currency_fixings - kept.currency_fixings,
            asset_fixings: written.asset_fixings - kept.asset_fixings,
            failures,
        };
        info!(
            currency_fixings = report.currency_fixings,
            asset_fixings = report.asset_fixings,
            failures = report.failures.len(),
            "full refresh finished"
        );
        Ok(report)
    }

    /// Fetch only what is missing: each series from the day after its last
    /// fixing (or `history_start` when empty) through `today`.
    #[instrument(skip_all, fields(%today))]
    pub async fn incremental_update(
        &self,
        settings: &Settings,
        catalog: &Catalog,
        store: &mut MemoryFixingStore,
        today: NaiveDate,
    ) -> Result<IngestionReport, CoreError> {
        let (jobs, mut failures) = Self::plan(catalog, store.base_currency(), |target| {
            let last = match target {
                Target::Currency(code) => store.last_currency_fixing_date(code),
                Target::Asset { name, .. } => store.last_asset_fixing_date(name),
            };
            match last {
                Some(last) => last.succ_opt().filter(|from| *from <= today),
                None => Some(settings.history_start),
            }
        });

        let (batch, fetch_failures) = self.fetch(jobs, today).await;
        failures.extend(fetch_failures.into_iter().map(|(_, f)| f));

        let written = store.append(batch)?;

        let report = IngestionReport {
            currency_fixings: written.currency_fixings,
            asset_fixings: written.asset_fixings,
            failures,
        };
        info!(
            currency_fixings = report.currency_fixings,
            asset_fixings = report.asset_fixings,
            failures = report.failures.len(),
            "incremental update finished"
        );
        Ok(report)
    }

    /// One job per fetchable catalog entry. `start` returns `None` to skip
    /// an entry that is already up to date. Assets without a home currency
    /// cannot be denominated and are reported straight away.
    fn plan(
        catalog: &Catalog,
        base_currency: &str,
        start: impl Fn(&Target) -> Option<NaiveDate>,
    ) -> (Vec<Job>, Vec<TickerFailure>) {
        let mut jobs = Vec::new();
        let mut failures = Vec::new();

        for currency in catalog.currencies().filter(|c| c.code != base_currency) {
            let target = Target::Currency(currency.code.clone());
            if let Some(from) = start(&target) {
                jobs.push(Job {
                    ticker: currency.ticker.clone(),
                    from,
                    target,
                });
            }
        }

        for asset in catalog.assets() {
            let Some(home) = asset.home_currency() else {
                warn!(asset = %asset.name, "asset has no home currency, skipping");
                failures.push(TickerFailure {
                    ticker: asset.isin.clone(),
                    reason: format!("asset '{}' has no home currency", asset.name),
                });
                continue;
            };
            let target = Target::Asset {
                name: asset.name.clone(),
                currency: home.to_string(),
            };
            if let Some(from) = start(&target) {
                jobs.push(Job {
                    ticker: asset.isin.clone(),
                    from,
                    target,
                });
            }
        }

        (jobs, failures)
    }

    /// Run every job concurrently. Failures come back with the series they
    /// belong to.
    async fn fetch(
        &self,
        jobs: Vec<Job>,
        to: NaiveDate,
    ) -> (FixingBatch, Vec<(Target, TickerFailure)>) {
        let results = join_all(jobs.iter().map(|job| async move {
            if job.from > to {
                return Ok(Vec::new());
            }
            self.registry.daily_closes(&job.ticker, job.from, to).await
        }))
        .await;

        let mut batch = FixingBatch::new();
        let mut failures = Vec::new();

        for (job, result) in jobs.into_iter().zip(results) {
            let points = match result {
                Ok(points) => points,
                Err(e) => {
                    warn!(ticker = %job.ticker, error = %e, "ticker refresh failed");
                    failures.push((
                        job.target,
                        TickerFailure {
                            ticker: job.ticker,
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
            };

            match job.target {
                Target::Currency(code) => batch.currency_fixings.extend(
                    points
                        .into_iter()
                        .filter(|p| p.close > Decimal::ZERO)
                        .map(|p| CurrencyFixing::new(code.clone(), p.date, p.close)),
                ),
                Target::Asset { name, currency } => batch.asset_fixings.extend(
                    points
                        .into_iter()
                        .filter(|p| p.close >= Decimal::ZERO)
                        .map(|p| AssetFixing::new(name.clone(), p.date, p.close, currency.clone())),
                ),
            }
        }

        (batch, failures)
    }
}
