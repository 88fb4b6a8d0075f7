//! Configuration loader.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// The native host is launched by the browser with no arguments, so a
    /// missing config file is the common case rather than an error.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.vaultzero`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.native.host_name, "com.vaultzero.host");
        assert_eq!(config.native.request_timeout_ms, 5000);
    }

    #[test]
    fn test_load_native_section() {
        let content = r#"
            [native]
            host_name = "com.example.vault"
            request_timeout_ms = 2500
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.native.host_name, "com.example.vault");
        assert_eq!(config.native.request_timeout_ms, 2500);
        assert_eq!(config.native.max_frame_bytes, 1024 * 1024);
    }

    #[test]
    fn test_load_autofill_section() {
        let content = r#"
            [autofill]
            save_offer_delay_ms = 500
            cooldown_ms = 1000

            [watcher]
            coalesce_ms = 0
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.autofill.save_offer_delay_ms, 500);
        assert_eq!(config.autofill.cooldown_ms, 1000);
        assert_eq!(config.autofill.auto_dismiss_ms, 10_000);
        assert_eq!(config.watcher.coalesce_ms, 0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[host]").unwrap();
        writeln!(file, "connect_deadline_ms = 750").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.host.connect_deadline_ms, 750);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/vaultbridge.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/vaultbridge.toml")).unwrap();
        assert_eq!(config.native.host_name, "com.vaultzero.host");
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("VAULTBRIDGE_TEST_HOST", "com.test.host");
        }
        let content = "[native]\nhost_name = \"${VAULTBRIDGE_TEST_HOST}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.native.host_name, "com.test.host");
        unsafe {
            std::env::remove_var("VAULTBRIDGE_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_VAULTBRIDGE_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/.vaultzero");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/.vaultzero"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
    }
}
