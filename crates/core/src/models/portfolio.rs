use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quantity of one asset acquired on a specific date ("packet").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier
    pub id: Uuid,

    /// Name of the held asset (catalog key)
    pub asset: String,

    /// Number of units; signed, a negative quantity is a short position
    pub quantity: i64,

    /// Date the units were acquired (daily granularity)
    pub acquisition_date: NaiveDate,
}

impl Holding {
    pub fn new(asset: impl Into<String>, quantity: i64, acquisition_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset: asset.into(),
            quantity,
            acquisition_date,
        }
    }
}

/// A named set of holdings owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: Uuid,

    /// Username of the owner. Recorded, not enforced: authorization is the
    /// caller's job.
    pub owner: String,

    pub name: String,

    /// Order carries no meaning.
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            holdings: Vec::new(),
        }
    }

    /// Number of holdings referencing the given asset.
    pub fn holdings_of(&self, asset: &str) -> usize {
        self.holdings.iter().filter(|h| h.asset == asset).count()
    }
}
