// ═══════════════════════════════════════════════════════════════════
// Storage Tests — MVSN container format, snapshot save/load
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use market_vision_core::errors::CoreError;
use market_vision_core::models::asset::Asset;
use market_vision_core::models::catalog::Catalog;
use market_vision_core::models::currency::Currency;
use market_vision_core::models::fixing::{AssetFixing, CurrencyFixing};
use market_vision_core::models::portfolio::{Holding, Portfolio};
use market_vision_core::models::settings::Settings;
use market_vision_core::models::snapshot::MarketSnapshot;
use market_vision_core::storage::format::{self, CURRENT_VERSION, HEADER_SIZE, MAGIC};
use market_vision_core::storage::manager::StorageManager;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn sample_snapshot() -> MarketSnapshot {
    let mut catalog = Catalog::new();
    catalog.add_currency(Currency::new("USD", "$")).unwrap();
    catalog.add_currency(Currency::new("EUR", "€")).unwrap();
    catalog
        .add_asset(Asset::new("ACME", "XS0000000001", "EUR"))
        .unwrap();

    let mut portfolio = Portfolio::new("alice", "Main");
    portfolio.holdings.push(Holding::new("ACME", 10, d(2024, 1, 1)));

    MarketSnapshot {
        settings: Settings::default(),
        catalog,
        currency_fixings: vec![
            CurrencyFixing::new("EUR", d(2024, 1, 1), dec!(1.10)),
            CurrencyFixing::new("EUR", d(2024, 2, 1), dec!(1.05)),
        ],
        asset_fixings: vec![AssetFixing::new("ACME", d(2024, 1, 1), dec!(110.1234), "EUR")],
        portfolios: vec![portfolio],
    }
}

// ═══════════════════════════════════════════════════════════════════
// Container format
// ═══════════════════════════════════════════════════════════════════

mod container_format {
    use super::*;

    #[test]
    fn header_layout() {
        let bytes = format::write_file(CURRENT_VERSION, b"payload");
        assert_eq!(bytes.len(), HEADER_SIZE + 7);
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), CURRENT_VERSION);
        assert_eq!(u64::from_le_bytes(bytes[6..14].try_into().unwrap()), 7);
        assert_eq!(&bytes[14..], b"payload");
    }

    #[test]
    fn read_returns_header_and_payload() {
        let bytes = format::write_file(CURRENT_VERSION, b"abc");
        let (header, payload) = format::read_file(&bytes).unwrap();
        assert_eq!(header.version, CURRENT_VERSION);
        assert_eq!(header.payload_len, 3);
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn empty_payload_is_valid() {
        let bytes = format::write_file(CURRENT_VERSION, &[]);
        let (_, payload) = format::read_file(&bytes).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn too_short_is_rejected() {
        assert!(matches!(
            format::read_file(b"MVSN"),
            Err(CoreError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = format::write_file(CURRENT_VERSION, b"abc");
        bytes[0] = b'X';
        assert!(matches!(
            format::read_file(&bytes),
            Err(CoreError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn unknown_versions_are_rejected() {
        for version in [0, CURRENT_VERSION + 1] {
            let bytes = format::write_file(version, b"abc");
            assert!(matches!(
                format::read_file(&bytes),
                Err(CoreError::UnsupportedVersion(v)) if v == version
            ));
        }
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = format::write_file(CURRENT_VERSION, b"abcdef");
        assert!(matches!(
            format::read_file(&bytes[..bytes.len() - 2]),
            Err(CoreError::InvalidFileFormat(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// StorageManager
// ═══════════════════════════════════════════════════════════════════

mod storage_manager {
    use super::*;

    #[test]
    fn bytes_round_trip_preserves_snapshot() {
        let snapshot = sample_snapshot();
        let bytes = StorageManager::save_to_bytes(&snapshot).unwrap();
        assert_eq!(&bytes[0..4], MAGIC);

        let loaded = StorageManager::load_from_bytes(&bytes).unwrap();
        assert_eq!(loaded, snapshot);
        // decimal scale survives
        assert_eq!(loaded.asset_fixings[0].close.to_string(), "110.1234");
    }

    #[test]
    fn corrupted_payload_fails_to_deserialize() {
        let bytes = format::write_file(CURRENT_VERSION, &[0xFF; 3]);
        assert!(matches!(
            StorageManager::load_from_bytes(&bytes),
            Err(CoreError::Deserialization(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.mvsn");
        let snapshot = sample_snapshot();

        StorageManager::save_to_file(&snapshot, &path).unwrap();
        let loaded = StorageManager::load_from_file(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StorageManager::load_from_file(dir.path().join("absent.mvsn")).unwrap_err();
        assert!(matches!(err, CoreError::FileIO(_)));
    }
}
