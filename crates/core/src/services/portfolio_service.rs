use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::catalog::Catalog;
use crate::models::portfolio::{Holding, Portfolio};

/// Creates portfolios and manages their holdings.
///
/// Pure business logic, no I/O and no pricing. Invalid holdings are
/// rejected here and never reach the valuers.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Create an empty portfolio. The name is required.
    pub fn create_portfolio(&self, owner: &str, name: &str) -> Result<Portfolio, CoreError> {
        let name = Self::validate_name(name)?;
        let portfolio = Portfolio::new(owner, name);
        debug!(id = %portfolio.id, %owner, "portfolio created");
        Ok(portfolio)
    }

    pub fn rename_portfolio(&self, portfolio: &mut Portfolio, name: &str) -> Result<(), CoreError> {
        portfolio.name = Self::validate_name(name)?;
        Ok(())
    }

    /// Add a holding after validating it against the catalog and `today`.
    pub fn add_holding(
        &self,
        portfolio: &mut Portfolio,
        catalog: &Catalog,
        asset: &str,
        quantity: i64,
        acquisition_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Uuid, CoreError> {
        let holding = Holding::new(asset, quantity, acquisition_date);
        self.validate_holding(catalog, &holding, today)?;
        let id = holding.id;
        portfolio.holdings.push(holding);
        debug!(portfolio = %portfolio.id, holding = %id, %asset, quantity, "holding added");
        Ok(id)
    }

    /// Remove a holding by its UUID. Fixings are unaffected.
    pub fn remove_holding(
        &self,
        portfolio: &mut Portfolio,
        holding_id: Uuid,
    ) -> Result<Holding, CoreError> {
        let idx = portfolio
            .holdings
            .iter()
            .position(|h| h.id == holding_id)
            .ok_or_else(|| CoreError::HoldingNotFound(holding_id.to_string()))?;
        Ok(portfolio.holdings.remove(idx))
    }

    /// Rules:
    /// - The asset must exist
    /// - Quantity must not be zero
    /// - The acquisition date must not be after today
    pub fn validate_holding(
        &self,
        catalog: &Catalog,
        holding: &Holding,
        today: NaiveDate,
    ) -> Result<(), CoreError> {
        catalog.asset(&holding.asset)?;

        if holding.quantity == 0 {
            return Err(CoreError::InvalidHolding(
                "quantity must not be zero".into(),
            ));
        }

        if holding.acquisition_date > today {
            return Err(CoreError::InvalidHolding(format!(
                "acquisition date {} is in the future",
                holding.acquisition_date
            )));
        }

        Ok(())
    }

    fn validate_name(name: &str) -> Result<String, CoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::ValidationError("Name is required".into()));
        }
        Ok(trimmed.to_string())
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
