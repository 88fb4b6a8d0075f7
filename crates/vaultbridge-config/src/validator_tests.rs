use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_invalid_host_name() {
    let mut config = Config::default();
    config.native.host_name = "Com.VaultZero.Host".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "native.host_name"));
}

#[test]
fn test_validate_empty_host_name() {
    let mut config = Config::default();
    config.native.host_name.clear();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = Config::default();
    config.native.request_timeout_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(
        result
            .errors
            .iter()
            .any(|e| e.path == "native.request_timeout_ms")
    );
}

#[test]
fn test_validate_large_frame_warning() {
    let mut config = Config::default();
    config.native.max_frame_bytes = 4 * 1024 * 1024;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "native.max_frame_bytes")
    );
}

#[test]
fn test_validate_missing_host_path_warning() {
    let mut config = Config::default();
    config.native.host_path = Some("/nonexistent/vaultzero-host".into());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "native.host_path"));
}

#[test]
fn test_validate_stability_before_delay_warning() {
    let mut config = Config::default();
    config.autofill.stability_check_ms = 100;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_validate_zero_retry_interval() {
    let mut config = Config::default();
    config.host.retry_interval_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
}

#[test]
fn test_validate_unknown_log_level() {
    let mut config = Config::default();
    config.logging.level = "verbose".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "logging.level"));
}

#[test]
fn test_into_result_reports_first_error() {
    let mut config = Config::default();
    config.native.request_timeout_ms = 0;
    config.host.vault_endpoint.clear();

    let err = ConfigValidator::validate(&config)
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(err.to_string().contains("native.request_timeout_ms"));
}

#[test]
fn test_validation_result_default() {
    let result = ValidationResult::default();
    assert!(result.is_valid());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}
