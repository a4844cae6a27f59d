//! Integration tests for thermwatch-common.

use thermwatch_common::{Error, LogFormat, LoggingConfig, init_tracing};

/// The global subscriber can only be installed once per process.
#[test]
fn test_init_tracing_rejects_second_install() {
    let config = LoggingConfig::default()
        .with_level(Some("debug".to_string()))
        .with_format(LogFormat::Json);

    init_tracing(&config).expect("first install should succeed");

    let second = init_tracing(&LoggingConfig::default());
    assert!(matches!(second, Err(Error::Config(_))));
}
