//! Service layer tests
//!
//! Provider construction (including the fatal configuration paths)
//! and lookup dispatch through GeoIpProvider.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;

use geostamp::config::LookupConfig;
use geostamp::errors::GeoStampError;
use geostamp::{GeoIpLookup, GeoIpProvider, GeoRecord};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Provider construction
// =============================================================================

#[test]
fn test_from_config_missing_database_is_fatal() {
    init_tracing();

    let config = LookupConfig {
        maxminddb_path: Some("/nonexistent/GeoLite2-City.mmdb".to_string()),
        api_url: None,
    };

    let err = GeoIpProvider::from_config(&config).expect_err("open must fail");
    assert_eq!(err.code(), "E002");
    assert!(err.message().contains("/nonexistent/GeoLite2-City.mmdb"));
}

#[test]
fn test_from_config_corrupt_database_is_fatal() {
    init_tracing();

    // Garbage bytes are not a valid mmdb file
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"not a maxmind database").expect("write");

    let config = LookupConfig {
        maxminddb_path: Some(file.path().display().to_string()),
        api_url: None,
    };

    let err = GeoIpProvider::from_config(&config).expect_err("open must fail");
    assert!(matches!(err, GeoStampError::LookupSource(_)));
}

#[test]
fn test_from_config_no_source_is_fatal() {
    init_tracing();

    let err = GeoIpProvider::from_config(&LookupConfig::default()).expect_err("must fail");
    assert_eq!(err.code(), "E001");
    assert!(matches!(err, GeoStampError::Configuration(_)));
}

#[test]
fn test_from_config_api_url_selects_external_provider() {
    init_tracing();

    let config = LookupConfig {
        maxminddb_path: None,
        api_url: Some("http://ip-api.com/json/{ip}?fields=status,countryCode".to_string()),
    };

    let provider = GeoIpProvider::from_config(&config).expect("construction must succeed");
    assert_eq!(provider.provider_name(), "ExternalAPI");
}

#[test]
fn test_maxminddb_path_wins_over_api_url() {
    init_tracing();

    // Both configured: the database path is tried first, and its
    // failure is fatal rather than falling back to the API
    let config = LookupConfig {
        maxminddb_path: Some("/nonexistent/GeoLite2-City.mmdb".to_string()),
        api_url: Some("http://ip-api.com/json/{ip}".to_string()),
    };

    assert!(GeoIpProvider::from_config(&config).is_err());
}

// =============================================================================
// Lookup dispatch
// =============================================================================

struct SingleRecordLookup;

#[async_trait]
impl GeoIpLookup for SingleRecordLookup {
    async fn lookup(&self, address: &str) -> Option<GeoRecord> {
        (address == "1.2.3.4").then(|| GeoRecord {
            country_code: "DE".to_string(),
            country_name: "Germany".to_string(),
            continent_code: "EU".to_string(),
            ..GeoRecord::default()
        })
    }

    fn name(&self) -> &'static str {
        "Single"
    }
}

#[tokio::test]
async fn test_provider_delegates_to_lookup() {
    let provider = GeoIpProvider::from_lookup(Arc::new(SingleRecordLookup));
    assert_eq!(provider.provider_name(), "Single");

    let record = provider.lookup("1.2.3.4").await.expect("should match");
    assert_eq!(record.country_code, "DE");
    assert_eq!(record.country_name, "Germany");
    // Sub-fields the source does not carry are empty, not None
    assert_eq!(record.country_code3, "");
    assert_eq!(record.city_name, "");

    assert!(provider.lookup("4.3.2.1").await.is_none());
    // Malformed and empty addresses are ordinary misses
    assert!(provider.lookup("not-an-ip").await.is_none());
    assert!(provider.lookup("").await.is_none());
}

#[tokio::test]
async fn test_provider_clone_shares_lookup() {
    let provider = GeoIpProvider::from_lookup(Arc::new(SingleRecordLookup));
    let clone = provider.clone();

    assert!(provider.lookup("1.2.3.4").await.is_some());
    assert!(clone.lookup("1.2.3.4").await.is_some());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_error_codes_and_display() {
    let config_err = GeoStampError::configuration("no lookup source configured");
    assert_eq!(config_err.code(), "E001");
    assert_eq!(config_err.error_type(), "Configuration Error");
    assert_eq!(
        config_err.to_string(),
        "Configuration Error: no lookup source configured"
    );

    let source_err = GeoStampError::lookup_source("failed to open database");
    assert_eq!(source_err.code(), "E002");
    assert_eq!(source_err.format_simple(), "Lookup Source Error: failed to open database");
}
