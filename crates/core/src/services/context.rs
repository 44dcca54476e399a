use chrono::NaiveDate;

use crate::models::catalog::Catalog;
use crate::series::FixingSeries;

/// Everything a valuation reads, passed explicitly.
///
/// `today` comes from the caller's clock; nothing in the engine reads the
/// system time.
#[derive(Clone, Copy)]
pub struct ValuationContext<'a> {
    pub series: &'a dyn FixingSeries,
    pub catalog: &'a Catalog,
    pub today: NaiveDate,
}

impl<'a> ValuationContext<'a> {
    pub fn new(series: &'a dyn FixingSeries, catalog: &'a Catalog, today: NaiveDate) -> Self {
        Self {
            series,
            catalog,
            today,
        }
    }
}
