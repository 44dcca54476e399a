use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::currency::Currency;

/// One row of the currency list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyListing {
    /// Currency code
    pub currency: String,

    pub symbol: String,

    /// Value of one unit in the requested currency
    pub converted_price: Decimal,

    /// Percentage change over the dynamic window; `None` when undefined
    pub monthly_dynamic: Option<Decimal>,

    /// False when a required fixing was missing and zero was reported
    pub complete: bool,
}

/// One row of the asset list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetListing {
    pub name: String,

    pub isin: String,

    pub home_currency: Option<Currency>,

    /// Latest price in the home currency
    pub current_price: Decimal,

    /// Latest price in the requested currency
    pub converted_price: Decimal,

    /// Percentage change of the home-currency price over the dynamic window
    pub monthly_dynamic: Option<Decimal>,

    pub complete: bool,
}

/// A holding as shown on a portfolio card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingDetail {
    pub id: Uuid,

    pub asset: AssetListing,

    pub quantity: i64,

    pub acquisition_date: NaiveDate,

    /// Unit price in the home currency on the acquisition date
    pub initial_price: Decimal,

    /// Unit price in the home currency today
    pub current_price: Decimal,

    /// Holding value in the requested currency on the acquisition date
    pub initial_converted_value: Decimal,

    /// Holding value in the requested currency today
    pub current_converted_value: Decimal,

    /// Percentage change since acquisition, in the home currency
    pub dynamic_from_acquisition: Decimal,

    /// Percentage change since acquisition, in the requested currency
    pub converted_dynamic_from_acquisition: Decimal,

    pub complete: bool,
}

/// Full portfolio view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCard {
    pub id: Uuid,

    pub name: String,

    /// Requested currency for all converted figures
    pub currency: String,

    pub current_value: Decimal,

    pub initial_value: Decimal,

    pub dynamic_from_acquisition: Decimal,

    pub holdings: Vec<HoldingDetail>,

    pub complete: bool,
}

/// Compact portfolio row for the owner's portfolio list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioListing {
    pub id: Uuid,

    pub name: String,

    pub current_value: Decimal,

    pub dynamic_from_acquisition: Decimal,

    pub complete: bool,
}

/// A portfolio value observed on one date of a history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDate,

    pub value: Decimal,

    pub complete: bool,
}
