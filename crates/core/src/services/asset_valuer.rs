use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::valuation::percent_change;

use super::context::ValuationContext;
use super::currency_converter::CurrencyConverter;

/// Prices an asset in any currency as of any date.
///
/// The stored close is converted at the rate prevailing on the **fixing's
/// own date**, not on the requested date: a price observed three days ago
/// is valued at the exchange rate of three days ago.
#[derive(Debug, Clone)]
pub struct AssetValuer {
    converter: CurrencyConverter,
}

impl AssetValuer {
    pub fn new(base_currency: &str) -> Self {
        Self {
            converter: CurrencyConverter::new(base_currency),
        }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Resolve the currency to price in: the requested one, or the asset's
    /// home currency.
    pub fn target_currency(
        &self,
        ctx: &ValuationContext<'_>,
        asset: &Asset,
        target: Option<&str>,
    ) -> Result<String, CoreError> {
        match target.or(asset.home_currency()) {
            Some(code) => self.converter.resolve(ctx.catalog, code),
            None => Err(CoreError::NoHomeCurrency(asset.name.clone())),
        }
    }

    /// Price of one unit of `asset` in `target` (default: home currency) as
    /// of `date` (default: today).
    ///
    /// `Ok(None)` when no fixing exists on or before the date, or when the
    /// conversion lacks a fixing.
    pub fn price(
        &self,
        ctx: &ValuationContext<'_>,
        asset: &Asset,
        target: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Option<Decimal>, CoreError> {
        let target = self.target_currency(ctx, asset, target)?;
        let date = date.unwrap_or(ctx.today);

        let Some(fixing) = ctx.series.latest_asset_fixing_as_of(&asset.name, date) else {
            return Ok(None);
        };

        Ok(self.converter.convert(
            ctx.series,
            fixing.close,
            &fixing.currency,
            &target,
            fixing.date,
        ))
    }

    /// Legacy boundary behaviour: missing data prices at zero.
    pub fn price_or_zero(
        &self,
        ctx: &ValuationContext<'_>,
        asset: &Asset,
        target: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Decimal, CoreError> {
        Ok(self.price(ctx, asset, target, date)?.unwrap_or(Decimal::ZERO))
    }

    /// Trailing percentage change over `window_days` ending today.
    ///
    /// `None` (undefined) when the earlier price is zero or either price is
    /// missing.
    pub fn dynamic(
        &self,
        ctx: &ValuationContext<'_>,
        asset: &Asset,
        window_days: u64,
        target: Option<&str>,
    ) -> Result<Option<Decimal>, CoreError> {
        let Some(previous_date) = ctx.today.checked_sub_days(Days::new(window_days)) else {
            return Ok(None);
        };
        let current = self.price(ctx, asset, target, Some(ctx.today))?;
        let previous = self.price(ctx, asset, target, Some(previous_date))?;

        Ok(match (current, previous) {
            (Some(current), Some(previous)) => percent_change(current, previous),
            _ => None,
        })
    }
}
