use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::fixing::{AssetFixing, CurrencyFixing};

/// Read-only, date-indexed access to the two fixing series.
///
/// Implementations must be safe to share across threads: every valuation
/// is a pure read, so callers may value holdings concurrently.
///
/// The base currency has no fixings; callers special-case it before
/// asking.
pub trait FixingSeries: Send + Sync {
    /// The fixing with the greatest date `<= date` for `currency`.
    fn latest_currency_fixing_as_of(&self, currency: &str, date: NaiveDate)
        -> Option<CurrencyFixing>;

    /// The value in base of `currency` fixed exactly on `date`.
    fn currency_fixing_on(&self, currency: &str, date: NaiveDate) -> Option<Decimal>;

    /// The closing fixing with the greatest date `<= date` for `asset`.
    fn latest_asset_fixing_as_of(&self, asset: &str, date: NaiveDate) -> Option<AssetFixing>;
}
