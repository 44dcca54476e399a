// ═══════════════════════════════════════════════════════════════════
// Provider Tests — FeedRegistry routing/fallback, feed ticker support,
// IngestionService full refresh and incremental update
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use market_vision_core::errors::CoreError;
use market_vision_core::models::asset::Asset;
use market_vision_core::models::catalog::Catalog;
use market_vision_core::models::currency::Currency;
use market_vision_core::models::fixing::{ClosePoint, CurrencyFixing};
use market_vision_core::models::settings::Settings;
use market_vision_core::providers::frankfurter::FrankfurterFeed;
use market_vision_core::providers::registry::FeedRegistry;
use market_vision_core::providers::traits::FixingFeed;
use market_vision_core::providers::yahoo_finance::YahooFinanceFeed;
use market_vision_core::series::memory::MemoryFixingStore;
use market_vision_core::series::traits::FixingSeries;
use market_vision_core::services::ingestion_service::IngestionService;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — Mock Feeds
// ═══════════════════════════════════════════════════════════════════

/// Serves fixed daily closes per ticker and records every request.
struct MockFeed {
    name: String,
    closes: HashMap<String, Vec<ClosePoint>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<std::sync::Mutex<Vec<(String, NaiveDate, NaiveDate)>>>,
}

impl MockFeed {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            closes: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    fn with(mut self, ticker: &str, points: &[(NaiveDate, Decimal)]) -> Self {
        self.closes.insert(
            ticker.to_string(),
            points
                .iter()
                .map(|(date, close)| ClosePoint {
                    date: *date,
                    close: *close,
                })
                .collect(),
        );
        self
    }
}

#[async_trait]
impl FixingFeed for MockFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, ticker: &str) -> bool {
        self.closes.contains_key(ticker)
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((ticker.to_string(), from, to));
        Ok(self.closes.get(ticker).cloned().unwrap_or_default())
    }
}

/// Fails for every ticker it claims to support.
struct FailingFeed {
    tickers: Vec<String>,
}

#[async_trait]
impl FixingFeed for FailingFeed {
    fn name(&self) -> &str {
        "Failing"
    }

    fn supports(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t == ticker)
    }

    async fn daily_closes(
        &self,
        ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<ClosePoint>, CoreError> {
        Err(CoreError::Api {
            provider: "Failing".into(),
            message: format!("boom for {ticker}"),
        })
    }
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.add_currency(Currency::new("USD", "$")).unwrap();
    catalog.add_currency(Currency::new("EUR", "€")).unwrap();
    catalog.add_currency(Currency::new("GBP", "£")).unwrap();
    catalog
        .add_asset(Asset::new("ACME", "XS0000000001", "EUR"))
        .unwrap();
    catalog
}

fn settings() -> Settings {
    Settings {
        history_start: d(2024, 1, 1),
        feed_lag_days: 10,
        ..Settings::default()
    }
}

fn market_feed() -> MockFeed {
    MockFeed::new("Mock")
        .with(
            "EURUSD=X",
            &[(d(2024, 1, 1), dec!(1.10)), (d(2024, 2, 1), dec!(1.05))],
        )
        .with(
            "GBPUSD=X",
            &[(d(2024, 1, 1), dec!(1.25)), (d(2024, 2, 1), dec!(1.27))],
        )
        .with(
            "XS0000000001",
            &[(d(2024, 1, 1), dec!(100)), (d(2024, 2, 1), dec!(110))],
        )
}

// ═══════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn empty_registry_has_no_feeds() {
        let registry = FeedRegistry::new();
        assert!(registry.feed_names().is_empty());
        assert!(registry.get_feeds_for("EURUSD=X").is_empty());
    }

    #[test]
    fn feeds_are_filtered_by_ticker_in_priority_order() {
        let mut registry = FeedRegistry::default();
        registry.register(Box::new(MockFeed::new("A").with("AAA", &[])));
        registry.register(Box::new(MockFeed::new("B").with("AAA", &[]).with("BBB", &[])));

        let names: Vec<_> = registry
            .get_feeds_for("AAA")
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(registry.get_feeds_for("BBB").len(), 1);
        assert_eq!(registry.feed_names(), vec!["A", "B"]);
    }

    #[test]
    fn defaults_include_frankfurter_fallback() {
        let registry = FeedRegistry::new_with_defaults("USD");
        assert!(registry.feed_names().contains(&"Frankfurter".to_string()));
        assert!(!registry.get_feeds_for("EURUSD=X").is_empty());
    }

    #[tokio::test]
    async fn unsupported_ticker_is_no_feed() {
        let registry = FeedRegistry::new();
        let err = registry
            .daily_closes("NOPE", d(2024, 1, 1), d(2024, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoFeed(t) if t == "NOPE"));
    }

    #[tokio::test]
    async fn falls_back_to_next_feed() {
        let mut registry = FeedRegistry::new();
        registry.register(Box::new(FailingFeed {
            tickers: vec!["EURUSD=X".into()],
        }));
        registry.register(Box::new(market_feed()));

        let points = registry
            .daily_closes("EURUSD=X", d(2024, 1, 1), d(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].close, dec!(1.05));
    }

    #[tokio::test]
    async fn last_error_is_returned_when_all_feeds_fail() {
        let mut registry = FeedRegistry::new();
        registry.register(Box::new(FailingFeed {
            tickers: vec!["EURUSD=X".into()],
        }));
        let err = registry
            .daily_closes("EURUSD=X", d(2024, 1, 1), d(2024, 3, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Api { .. }));
    }

    #[tokio::test]
    async fn points_are_clipped_to_range_and_sorted() {
        let mut registry = FeedRegistry::new();
        registry.register(Box::new(MockFeed::new("Mock").with(
            "T",
            &[
                (d(2024, 3, 1), dec!(3)),
                (d(2024, 1, 1), dec!(1)),
                (d(2024, 2, 1), dec!(2)),
            ],
        )));
        let points = registry
            .daily_closes("T", d(2024, 1, 15), d(2024, 3, 1))
            .await
            .unwrap();
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 2, 1), d(2024, 3, 1)]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Feed ticker support
// ═══════════════════════════════════════════════════════════════════

mod feed_support {
    use super::*;

    #[test]
    fn frankfurter_quotes_pairs_against_base() {
        let feed = FrankfurterFeed::new("USD");
        assert_eq!(feed.name(), "Frankfurter");
        assert!(feed.supports("EURUSD=X"));
        assert!(feed.supports("GBPUSD=X"));
        assert!(!feed.supports("EURPLN=X"));
        assert!(!feed.supports("XS0000000001"));
    }

    #[test]
    fn yahoo_supports_any_non_empty_ticker() {
        let Ok(feed) = YahooFinanceFeed::new() else {
            return; // connector unavailable in this environment
        };
        assert_eq!(feed.name(), "Yahoo Finance");
        assert!(feed.supports("EURUSD=X"));
        assert!(feed.supports("US0378331005"));
        assert!(!feed.supports("  "));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Ingestion
// ═══════════════════════════════════════════════════════════════════

mod ingestion {
    use super::*;

    fn service(feed: MockFeed) -> IngestionService {
        let mut registry = FeedRegistry::new();
        registry.register(Box::new(feed));
        IngestionService::new(registry)
    }

    #[test_log::test(tokio::test)]
    async fn full_refresh_loads_every_series() {
        let feed = market_feed();
        let requests = feed.requests.clone();
        let svc = service(feed);
        let mut store = MemoryFixingStore::new("USD");

        let report = svc
            .full_refresh(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();

        assert_eq!(report.currency_fixings, 4);
        assert_eq!(report.asset_fixings, 2);
        assert!(report.is_complete());
        assert_eq!(report.written(), 6);

        let acme = store.latest_asset_fixing_as_of("ACME", d(2024, 3, 1)).unwrap();
        assert_eq!(acme.close, dec!(110));
        assert_eq!(acme.currency, "EUR");

        // base currency is never fetched; range ends feed_lag_days before today
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|(t, _, _)| t != "USDUSD=X"));
        assert!(requests
            .iter()
            .all(|(_, from, to)| *from == d(2024, 1, 1) && *to == d(2024, 2, 20)));
    }

    #[tokio::test]
    async fn full_refresh_replaces_existing_series() {
        let svc = service(market_feed());
        let mut store = MemoryFixingStore::new("USD");
        store
            .record_currency_fixing(CurrencyFixing::new("EUR", d(2023, 6, 1), dec!(1.08)))
            .unwrap();

        svc.full_refresh(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(store.currency_fixing_on("EUR", d(2023, 6, 1)), None);
        assert_eq!(store.last_currency_fixing_date("EUR"), Some(d(2024, 2, 1)));
    }

    #[test_log::test(tokio::test)]
    async fn failed_ticker_is_reported_and_keeps_its_history() {
        // No GBP ticker in this feed
        let feed = MockFeed::new("Mock")
            .with("EURUSD=X", &[(d(2024, 2, 1), dec!(1.05))])
            .with("XS0000000001", &[(d(2024, 2, 1), dec!(110))]);
        let svc = service(feed);
        let mut store = MemoryFixingStore::new("USD");
        store
            .record_currency_fixing(CurrencyFixing::new("GBP", d(2023, 6, 1), dec!(1.26)))
            .unwrap();

        let report = svc
            .full_refresh(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker, "GBPUSD=X");
        assert_eq!(report.currency_fixings, 1);
        assert_eq!(store.currency_fixing_on("GBP", d(2023, 6, 1)), Some(dec!(1.26)));
        assert_eq!(store.currency_fixing_on("EUR", d(2024, 2, 1)), Some(dec!(1.05)));
    }

    #[tokio::test]
    async fn report_counts_stored_fixings_not_feed_rows() {
        // the feed repeats Feb 1 for EUR and ACME
        let feed = market_feed()
            .with(
                "EURUSD=X",
                &[(d(2024, 2, 1), dec!(1.05)), (d(2024, 2, 1), dec!(1.06))],
            )
            .with(
                "XS0000000001",
                &[(d(2024, 2, 1), dec!(110)), (d(2024, 2, 1), dec!(111))],
            );
        let svc = service(feed);
        let mut store = MemoryFixingStore::new("USD");

        let report = svc
            .full_refresh(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();
        // EUR once, GBP twice
        assert_eq!(report.currency_fixings, 3);
        assert_eq!(report.asset_fixings, 1);
        assert_eq!(report.written(), store.len());
        assert_eq!(store.currency_fixing_on("EUR", d(2024, 2, 1)), Some(dec!(1.06)));

        store = MemoryFixingStore::new("USD");
        let report = svc
            .incremental_update(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(report.written(), 4);
        assert_eq!(report.written(), store.len());
    }

    #[tokio::test]
    async fn homeless_asset_is_reported() {
        let mut catalog = catalog();
        catalog.remove_currency("EUR").unwrap();
        let svc = service(market_feed());
        let mut store = MemoryFixingStore::new("USD");

        let report = svc
            .full_refresh(&settings(), &catalog, &mut store, d(2024, 3, 1))
            .await
            .unwrap();
        assert_eq!(report.asset_fixings, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker, "XS0000000001");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn incremental_update_fetches_only_new_days() {
        let feed = market_feed()
            .with(
                "EURUSD=X",
                &[
                    (d(2024, 1, 1), dec!(1.10)),
                    (d(2024, 2, 1), dec!(1.05)),
                    (d(2024, 3, 1), dec!(1.07)),
                ],
            );
        let requests = feed.requests.clone();
        let svc = service(feed);
        let mut store = MemoryFixingStore::new("USD");
        store
            .record_currency_fixing(CurrencyFixing::new("EUR", d(2024, 2, 1), dec!(1.05)))
            .unwrap();

        let report = svc
            .incremental_update(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();

        // EUR: Mar 1 only. GBP and ACME: full history from history_start.
        assert_eq!(report.currency_fixings, 3);
        assert_eq!(report.asset_fixings, 2);
        assert_eq!(store.currency_fixing_on("EUR", d(2024, 3, 1)), Some(dec!(1.07)));

        let requests = requests.lock().unwrap();
        let eur = requests.iter().find(|(t, _, _)| t == "EURUSD=X").unwrap();
        assert_eq!((eur.1, eur.2), (d(2024, 2, 2), d(2024, 3, 1)));
        let gbp = requests.iter().find(|(t, _, _)| t == "GBPUSD=X").unwrap();
        assert_eq!(gbp.1, d(2024, 1, 1));
    }

    #[tokio::test]
    async fn up_to_date_series_are_not_fetched() {
        let feed = market_feed();
        let calls = feed.calls.clone();
        let svc = service(feed);
        let mut store = MemoryFixingStore::new("USD");
        for code in ["EUR", "GBP"] {
            store
                .record_currency_fixing(CurrencyFixing::new(code, d(2024, 3, 1), dec!(1)))
                .unwrap();
        }

        let report = svc
            .incremental_update(&settings(), &catalog(), &mut store, d(2024, 3, 1))
            .await
            .unwrap();
        // only ACME is behind
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.currency_fixings, 0);
        assert_eq!(report.asset_fixings, 2);
    }
}
