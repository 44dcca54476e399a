pub mod registry;
pub mod traits;

// Feed implementations
pub mod frankfurter;
pub mod yahoo_finance;
