//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error, if any, into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_native(config, &mut result);
        Self::validate_autofill(config, &mut result);
        Self::validate_host(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_native(config: &Config, result: &mut ValidationResult) {
        let native = &config.native;

        // Chrome only accepts lowercase alphanumerics, dots and underscores.
        let valid_name = !native.host_name.is_empty()
            && !native.host_name.starts_with('.')
            && !native.host_name.ends_with('.')
            && native
                .host_name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_');
        if !valid_name {
            result.add_error(ValidationError::new(
                "native.host_name",
                format!("Invalid native host name '{}'", native.host_name),
            ));
        }

        if native.request_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "native.request_timeout_ms",
                "request_timeout_ms must be greater than 0",
            ));
        }

        if native.max_frame_bytes == 0 {
            result.add_error(ValidationError::new(
                "native.max_frame_bytes",
                "max_frame_bytes must be greater than 0",
            ));
        }

        // Browsers cap host-to-extension messages at 1 MiB.
        if native.max_frame_bytes > 1024 * 1024 {
            result.add_warning(ValidationWarning::new(
                "native.max_frame_bytes",
                "max_frame_bytes exceeds the 1 MiB browser limit",
            ));
        }

        if let Some(ref path) = native.host_path {
            if !path.exists() {
                result.add_warning(ValidationWarning::new(
                    "native.host_path",
                    format!("Host executable does not exist: {:?}", path),
                ));
            }
        }
    }

    fn validate_autofill(config: &Config, result: &mut ValidationResult) {
        let autofill = &config.autofill;

        if autofill.auto_dismiss_ms == 0 {
            result.add_error(ValidationError::new(
                "autofill.auto_dismiss_ms",
                "auto_dismiss_ms must be greater than 0",
            ));
        }

        if autofill.stability_check_ms < autofill.save_offer_delay_ms {
            result.add_warning(ValidationWarning::new(
                "autofill.stability_check_ms",
                "stability check fires before the save offer delay elapses",
            ));
        }

        if autofill.cooldown_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "autofill.cooldown_ms",
                "cooldown disabled, a dismissed prompt may reappear immediately",
            ));
        }
    }

    fn validate_host(config: &Config, result: &mut ValidationResult) {
        let host = &config.host;

        if host.vault_endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "host.vault_endpoint",
                "vault_endpoint cannot be empty",
            ));
        }

        if host.connect_deadline_ms == 0 {
            result.add_error(ValidationError::new(
                "host.connect_deadline_ms",
                "connect_deadline_ms must be greater than 0",
            ));
        }

        if host.retry_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "host.retry_interval_ms",
                "retry_interval_ms must be greater than 0",
            ));
        } else if host.retry_interval_ms > host.connect_deadline_ms {
            result.add_warning(ValidationWarning::new(
                "host.retry_interval_ms",
                "retry_interval_ms exceeds connect_deadline_ms, only one attempt will be made",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, valid_levels
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
