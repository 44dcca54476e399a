use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::fixing::{AssetFixing, CurrencyFixing};
use super::portfolio::Portfolio;
use super::settings::Settings;

/// The main persisted data container. Everything in here gets serialized
/// into a `.mvsn` snapshot file.
///
/// Fixings are stored flat; the in-memory series index is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub settings: Settings,

    pub catalog: Catalog,

    pub currency_fixings: Vec<CurrencyFixing>,

    pub asset_fixings: Vec<AssetFixing>,

    #[serde(default)]
    pub portfolios: Vec<Portfolio>,
}
