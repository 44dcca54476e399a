pub mod asset_valuer;
pub mod context;
pub mod currency_converter;
pub mod history_service;
pub mod holding_valuer;
pub mod ingestion_service;
pub mod portfolio_aggregator;
pub mod portfolio_service;
pub mod report_service;
