pub mod asset;
pub mod catalog;
pub mod currency;
pub mod fixing;
pub mod ingestion;
pub mod portfolio;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod valuation;
