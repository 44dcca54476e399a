use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::catalog::Catalog;
use crate::models::currency::normalize_code;
use crate::models::valuation::percent_change;
use crate::series::FixingSeries;

/// Exchange rates between any two currencies, pivoted through the base
/// currency.
///
/// Every stored fixing is "value of one unit in base", so:
/// - base → X uses X's as-of fixing, inverted;
/// - X → base uses X's as-of fixing directly;
/// - X → Y finds X's as-of fixing, then Y's fixing on **that same date**.
///
/// The cross leg is an exact-date lookup so both sides are observed on the
/// same day. Cross rates are therefore less available than base-pivoted
/// ones; a missing leg is `None`, never a stale mix.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    base_currency: String,
}

impl CurrencyConverter {
    pub fn new(base_currency: &str) -> Self {
        Self {
            base_currency: normalize_code(base_currency),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Normalize `code` and check it names the base or a catalog currency.
    pub fn resolve(&self, catalog: &Catalog, code: &str) -> Result<String, CoreError> {
        let code = normalize_code(code);
        if code == self.base_currency || catalog.contains_currency(&code) {
            Ok(code)
        } else {
            Err(CoreError::UnknownCurrency(code))
        }
    }

    /// The rate `R` with `amount_in_to = amount_in_from * R` as of `date`.
    /// `None` when a required fixing is missing.
    pub fn rate(
        &self,
        series: &dyn FixingSeries,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Option<Decimal> {
        let from = normalize_code(from);
        let to = normalize_code(to);

        if from == to {
            return Some(Decimal::ONE);
        }

        if from == self.base_currency {
            let target = series.latest_currency_fixing_as_of(&to, date);
            if target.is_none() {
                debug!(currency = %to, %date, "no fixing as of date");
            }
            return Decimal::ONE.checked_div(target?.value_in_base);
        }

        if to == self.base_currency {
            let source = series.latest_currency_fixing_as_of(&from, date);
            if source.is_none() {
                debug!(currency = %from, %date, "no fixing as of date");
            }
            return source.map(|f| f.value_in_base);
        }

        let source = series.latest_currency_fixing_as_of(&from, date)?;
        let Some(target_in_base) = series.currency_fixing_on(&to, source.date) else {
            debug!(%from, %to, fixing_date = %source.date, "cross leg missing on source fixing date");
            return None;
        };
        source.value_in_base.checked_div(target_in_base)
    }

    /// Legacy boundary behaviour: a missing rate reads as zero.
    pub fn rate_or_zero(
        &self,
        series: &dyn FixingSeries,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Decimal {
        self.rate(series, from, to, date).unwrap_or(Decimal::ZERO)
    }

    /// Convert `amount` of `from` into `to` as of `date`.
    pub fn convert(
        &self,
        series: &dyn FixingSeries,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Option<Decimal> {
        self.rate(series, from, to, date)?.checked_mul(amount)
    }

    /// Percentage change of one unit of `currency`, priced in `target`,
    /// between `today - window_days` and `today`. `None` when either end
    /// is missing or the earlier price is zero.
    pub fn dynamic(
        &self,
        series: &dyn FixingSeries,
        currency: &str,
        target: &str,
        window_days: u64,
        today: NaiveDate,
    ) -> Option<Decimal> {
        let previous_date = today.checked_sub_days(Days::new(window_days))?;
        let current = self.rate(series, currency, target, today)?;
        let previous = self.rate(series, currency, target, previous_date)?;
        percent_change(current, previous)
    }
}
