use chrono::{Days, NaiveDate};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::report::ValuePoint;
use crate::models::valuation::round_money;

use super::context::ValuationContext;
use super::portfolio_aggregator::PortfolioAggregator;

/// Maximum history range in days (10 years).
pub const MAX_HISTORY_RANGE_DAYS: i64 = 3650;

/// Portfolio value over time, ready for charting.
///
/// Each point values the holdings acquired by that date, all at that date.
/// As-of lookups already carry the last close across weekends and holidays.
pub struct HistoryService {
    aggregator: PortfolioAggregator,
    scale: u32,
}

impl HistoryService {
    pub fn new(base_currency: &str, scale: u32) -> Self {
        Self {
            aggregator: PortfolioAggregator::new(base_currency),
            scale,
        }
    }

    /// One point every `step_days` from `from` through `to` (inclusive).
    pub fn portfolio_history(
        &self,
        ctx: &ValuationContext<'_>,
        portfolio: &Portfolio,
        target: &str,
        from: NaiveDate,
        to: NaiveDate,
        step_days: u64,
    ) -> Result<Vec<ValuePoint>, CoreError> {
        if from > to {
            return Err(CoreError::ValidationError(format!(
                "'from' date ({from}) must not be after 'to' date ({to})"
            )));
        }
        let range_days = (to - from).num_days();
        if range_days > MAX_HISTORY_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "History range of {range_days} days exceeds maximum of {MAX_HISTORY_RANGE_DAYS} days (10 years)"
            )));
        }
        if step_days == 0 {
            return Err(CoreError::ValidationError(
                "step_days must be at least 1".into(),
            ));
        }

        let target = self
            .aggregator
            .holding_valuer()
            .asset_valuer()
            .converter()
            .resolve(ctx.catalog, target)?;

        let mut points = Vec::new();
        let mut date = from;
        while date <= to {
            let value = self.aggregator.value_at(ctx, portfolio, &target, date)?;
            points.push(ValuePoint {
                date,
                value: round_money(value.amount, self.scale),
                complete: value.complete,
            });
            match date.checked_add_days(Days::new(step_days)) {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(points)
    }
}
