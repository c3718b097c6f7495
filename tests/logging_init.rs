use bh1730_script::config::LoggingSettings;
use bh1730_script::logging;
use bh1730_script::AppError;
use serial_test::serial;

#[test]
#[serial]
fn test_env_filter_falls_back_to_configured_level() {
    std::env::remove_var("RUST_LOG");
    let settings = LoggingSettings {
        level: "warn".to_string(),
        json: false,
    };
    let filter = logging::env_filter(&settings);
    assert_eq!(filter.to_string(), "warn");
}

#[test]
#[serial]
fn test_second_init_is_rejected() {
    let settings = LoggingSettings::default();
    // Only one global subscriber can ever be installed
    let _ = logging::init(&settings);
    let second = logging::init(&settings);
    assert!(matches!(second, Err(AppError::Logging(_))));
}
