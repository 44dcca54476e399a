use rust_decimal::Decimal;
use tracing::instrument;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::portfolio::{Holding, Portfolio};
use crate::models::report::{
    AssetListing, CurrencyListing, HoldingDetail, PortfolioCard, PortfolioListing,
};
use crate::models::settings::Settings;
use crate::models::valuation::{round_money, Valuation};

use super::context::ValuationContext;
use super::portfolio_aggregator::PortfolioAggregator;

/// Builds the rows served by the valuation API.
///
/// This is the only place where missing data is coerced to zero. Every row
/// carries a `complete` flag so a zero caused by missing fixings can be told
/// apart from a real zero. Figures are rounded to `display_scale` digits.
pub struct ReportService {
    aggregator: PortfolioAggregator,
    window_days: u64,
    scale: u32,
}

impl ReportService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            aggregator: PortfolioAggregator::new(&settings.base_currency),
            window_days: settings.dynamic_window_days,
            scale: settings.display_scale,
        }
    }

    pub fn aggregator(&self) -> &PortfolioAggregator {
        &self.aggregator
    }

    fn round(&self, value: Decimal) -> Decimal {
        round_money(value, self.scale)
    }

    fn round_opt(&self, value: Option<Decimal>) -> Option<Decimal> {
        value.map(|v| self.round(v))
    }

    // ── Currencies ──────────────────────────────────────────────────

    /// Every catalog currency priced in `target`, sorted by code.
    #[instrument(skip(self, ctx))]
    pub fn currency_list(
        &self,
        ctx: &ValuationContext<'_>,
        target: &str,
    ) -> Result<Vec<CurrencyListing>, CoreError> {
        let converter = self.aggregator.holding_valuer().asset_valuer().converter();
        let target = converter.resolve(ctx.catalog, target)?;

        Ok(ctx
            .catalog
            .currencies()
            .map(|currency| {
                let price =
                    Valuation::from(converter.rate(ctx.series, &currency.code, &target, ctx.today));
                let dynamic = converter.dynamic(
                    ctx.series,
                    &currency.code,
                    &target,
                    self.window_days,
                    ctx.today,
                );
                CurrencyListing {
                    currency: currency.code.clone(),
                    symbol: currency.symbol.clone(),
                    converted_price: self.round(price.amount),
                    monthly_dynamic: self.round_opt(dynamic),
                    complete: price.complete,
                }
            })
            .collect())
    }

    // ── Assets ──────────────────────────────────────────────────────

    /// Every catalog asset priced in its home currency and in `target`,
    /// sorted by name.
    #[instrument(skip(self, ctx))]
    pub fn asset_list(
        &self,
        ctx: &ValuationContext<'_>,
        target: &str,
    ) -> Result<Vec<AssetListing>, CoreError> {
        let converter = self.aggregator.holding_valuer().asset_valuer().converter();
        let target = converter.resolve(ctx.catalog, target)?;

        ctx.catalog
            .assets()
            .map(|asset| self.asset_listing(ctx, asset, &target))
            .collect()
    }

    pub fn asset_listing(
        &self,
        ctx: &ValuationContext<'_>,
        asset: &Asset,
        target: &str,
    ) -> Result<AssetListing, CoreError> {
        let valuer = self.aggregator.holding_valuer().asset_valuer();

        let converted = Valuation::from(valuer.price(ctx, asset, Some(target), None)?);
        let (current, dynamic) = match asset.home_currency() {
            Some(_) => (
                Valuation::from(valuer.price(ctx, asset, None, None)?),
                valuer.dynamic(ctx, asset, self.window_days, None)?,
            ),
            None => (Valuation::missing(), None),
        };
        let home_currency = asset
            .home_currency()
            .and_then(|code| ctx.catalog.currency(code).ok())
            .cloned();

        Ok(AssetListing {
            name: asset.name.clone(),
            isin: asset.isin.clone(),
            home_currency,
            current_price: self.round(current.amount),
            converted_price: self.round(converted.amount),
            monthly_dynamic: self.round_opt(dynamic),
            complete: current.complete && converted.complete,
        })
    }

    // ── Portfolios ──────────────────────────────────────────────────

    /// Full portfolio view with every holding priced in `target`.
    #[instrument(skip(self, ctx, portfolio), fields(portfolio = %portfolio.id))]
    pub fn portfolio_card(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
    ) -> Result<PortfolioCard, CoreError> {
        let converter = self.aggregator.holding_valuer().asset_valuer().converter();
        let target = converter.resolve(ctx.catalog, target)?;

        let current = self.aggregator.current_value(ctx, portfolio, &target)?;
        let initial = self.aggregator.initial_value(ctx, portfolio, &target)?;
        let dynamic = self
            .aggregator
            .dynamic_from_acquisition(ctx, portfolio, &target)?;

        let holdings = portfolio
            .holdings
            .iter()
            .map(|h| self.holding_detail(ctx, h, &target))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PortfolioCard {
            id: portfolio.id,
            name: portfolio.name.clone(),
            currency: target,
            current_value: self.round(current.amount),
            initial_value: self.round(initial.amount),
            dynamic_from_acquisition: self.round(dynamic.amount),
            complete: current.complete && initial.complete && holdings.iter().all(|h| h.complete),
            holdings,
        })
    }

    /// One compact row per portfolio.
    pub fn portfolio_list<'p>(
        &self,
        ctx: &ValuationContext<'_>,
        portfolios: impl IntoIterator<Item = &'p Portfolio>,
        target: &str,
    ) -> Result<Vec<PortfolioListing>, CoreError> {
        let converter = self.aggregator.holding_valuer().asset_valuer().converter();
        let target = converter.resolve(ctx.catalog, target)?;

        portfolios
            .into_iter()
            .map(|p| {
                let current = self.aggregator.current_value(ctx, p, &target)?;
                let dynamic = self.aggregator.dynamic_from_acquisition(ctx, p, &target)?;
                Ok(PortfolioListing {
                    id: p.id,
                    name: p.name.clone(),
                    current_value: self.round(current.amount),
                    dynamic_from_acquisition: self.round(dynamic.amount),
                    complete: current.complete && dynamic.complete,
                })
            })
            .collect()
    }

    fn holding_detail(
        &self,
        ctx: &ValuationContext<'_>,
        holding: &Holding,
        target: &str,
    ) -> Result<HoldingDetail, CoreError> {
        let holding_valuer = self.aggregator.holding_valuer();
        let asset_valuer = holding_valuer.asset_valuer();
        let asset = ctx.catalog.asset(&holding.asset)?;

        let initial_converted =
            Valuation::from(holding_valuer.initial_value(ctx, holding, Some(target))?);
        let current_converted =
            Valuation::from(holding_valuer.value(ctx, holding, Some(target), None)?);
        let converted_dynamic = holding_valuer.dynamic_from_acquisition(ctx, holding, Some(target))?;

        // Home-currency figures are undefined once the asset lost its currency.
        let acquired = holding.acquisition_date <= ctx.today;
        let (initial_price, current_price, dynamic) = match asset.home_currency() {
            Some(_) => (
                if acquired {
                    Valuation::from(asset_valuer.price(
                        ctx,
                        asset,
                        None,
                        Some(holding.acquisition_date),
                    )?)
                } else {
                    Valuation::missing()
                },
                Valuation::from(asset_valuer.price(ctx, asset, None, None)?),
                holding_valuer.dynamic_from_acquisition(ctx, holding, None)?,
            ),
            None => (
                Valuation::missing(),
                Valuation::missing(),
                Valuation::missing(),
            ),
        };

        let complete = [
            initial_converted,
            current_converted,
            converted_dynamic,
            initial_price,
            current_price,
            dynamic,
        ]
        .iter()
        .all(|v| v.complete);

        Ok(HoldingDetail {
            id: holding.id,
            asset: self.asset_listing(ctx, asset, target)?,
            quantity: holding.quantity,
            acquisition_date: holding.acquisition_date,
            initial_price: self.round(initial_price.amount),
            current_price: self.round(current_price.amount),
            initial_converted_value: self.round(initial_converted.amount),
            current_converted_value: self.round(current_converted.amount),
            dynamic_from_acquisition: self.round(dynamic.amount),
            converted_dynamic_from_acquisition: self.round(converted_dynamic.amount),
            complete,
        })
    }
}
