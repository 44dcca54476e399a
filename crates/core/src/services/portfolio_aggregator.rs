use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::valuation::{percent_change, Valuation};

use super::context::ValuationContext;
use super::holding_valuer::HoldingValuer;

/// Portfolio-level sums of holding values.
///
/// A holding whose price data is missing contributes zero and marks the
/// total incomplete; it is never dropped silently.
#[derive(Debug, Clone)]
pub struct PortfolioAggregator {
    holding_valuer: HoldingValuer,
}

impl PortfolioAggregator {
    pub fn new(base_currency: &str) -> Self {
        Self {
            holding_valuer: HoldingValuer::new(base_currency),
        }
    }

    pub fn holding_valuer(&self) -> &HoldingValuer {
        &self.holding_valuer
    }

    /// Sum of every holding valued today. Each holding resolves its own
    /// latest fixing, so stale holdings are included, just individually
    /// stale.
    pub fn current_value(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
    ) -> Result<Valuation, CoreError> {
        portfolio
            .holdings
            .iter()
            .map(|h| {
                self.holding_valuer
                    .value(ctx, h, Some(target), None)
                    .map(Valuation::from)
            })
            .sum()
    }

    /// Cost basis: each holding valued at **its own** acquisition date.
    pub fn initial_value(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
    ) -> Result<Valuation, CoreError> {
        portfolio
            .holdings
            .iter()
            .map(|h| {
                self.holding_valuer
                    .initial_value(ctx, h, Some(target))
                    .map(Valuation::from)
            })
            .sum()
    }

    /// Value of the holdings already acquired on `date`, all priced at that
    /// one date.
    pub fn value_at(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
        date: NaiveDate,
    ) -> Result<Valuation, CoreError> {
        portfolio
            .holdings
            .iter()
            .filter(|h| h.acquisition_date <= date)
            .map(|h| {
                self.holding_valuer
                    .value(ctx, h, Some(target), Some(date))
                    .map(Valuation::from)
            })
            .sum()
    }

    /// `(current - initial) / initial * 100`, or 0 when the initial value
    /// is zero.
    pub fn dynamic_from_acquisition(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
    ) -> Result<Valuation, CoreError> {
        let initial = self.initial_value(ctx, portfolio, target)?;
        let current = self.current_value(ctx, portfolio, target)?;

        Ok(Valuation {
            amount: percent_change(current.amount, initial.amount).unwrap_or(Decimal::ZERO),
            complete: initial.complete && current.complete,
        })
    }
}
