use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::portfolio::Holding;
use crate::models::valuation::{percent_change, Valuation};

use super::asset_valuer::AssetValuer;
use super::context::ValuationContext;

/// Values a holding: `quantity × unit price` at a given date.
#[derive(Debug, Clone)]
pub struct HoldingValuer {
    asset_valuer: AssetValuer,
}

impl HoldingValuer {
    pub fn new(base_currency: &str) -> Self {
        Self {
            asset_valuer: AssetValuer::new(base_currency),
        }
    }

    pub fn asset_valuer(&self) -> &AssetValuer {
        &self.asset_valuer
    }

    /// Value in `target` (default: the asset's home currency) as of `date`
    /// (default: today). `Ok(None)` when price data is missing.
    pub fn value(
        &self,
        ctx: &ValuationContext<'_>,
        holding: &Holding,
        target: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Option<Decimal>, CoreError> {
        let asset = ctx.catalog.asset(&holding.asset)?;
        let price = self.asset_valuer.price(ctx, asset, target, date)?;
        Ok(price.and_then(|p| p.checked_mul(Decimal::from(holding.quantity))))
    }

    /// Value on the acquisition date. `Ok(None)` when that date lies after
    /// `ctx.today`: such a holding has no initial value yet.
    pub fn initial_value(
        &self,
        ctx: &ValuationContext<'_>,
        holding: &Holding,
        target: Option<&str>,
    ) -> Result<Option<Decimal>, CoreError> {
        if holding.acquisition_date > ctx.today {
            debug!(
                holding = %holding.id,
                acquired = %holding.acquisition_date,
                today = %ctx.today,
                "holding acquired after valuation date"
            );
            return Ok(None);
        }
        self.value(ctx, holding, target, Some(holding.acquisition_date))
    }

    /// Percentage change from the acquisition date to today.
    ///
    /// Reports 0 when the initial value is zero or missing; a missing value
    /// at either end marks the result incomplete.
    pub fn dynamic_from_acquisition(
        &self,
        ctx: &ValuationContext<'_>,
        holding: &Holding,
        target: Option<&str>,
    ) -> Result<Valuation, CoreError> {
        let initial = self.initial_value(ctx, holding, target)?;
        let current = self.value(ctx, holding, target, None)?;

        Ok(match (initial, current) {
            (Some(initial), Some(current)) => {
                Valuation::available(percent_change(current, initial).unwrap_or(Decimal::ZERO))
            }
            _ => Valuation::missing(),
        })
    }
}
