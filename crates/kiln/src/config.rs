//! # Runtime Configuration
//!
//! ```toml
//! [core]
//! strict_check = true
//! process_tag = 2
//!
//! [modules]
//! default_check_loading = false
//! ```

use std::path::Path;

use kiln_core::CoreConfig;
use kiln_data::ModuleConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// Every setting of a runtime. Missing sections take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Pool, identifiers and clock.
    pub core: CoreConfig,
    /// Module lifecycle.
    pub modules: ModuleConfig,
}

impl RuntimeConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// `Config` for malformed TOML, `Core` for out-of-range core values.
    pub fn from_toml_str(text: &str) -> RuntimeResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.core.validate()?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// `Config` when the file cannot be read, otherwise as
    /// [`RuntimeConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::CoreError;

    #[test]
    fn test_sections_are_optional() {
        let config = RuntimeConfig::from_toml_str("[modules]\ndefault_check_loading = false\n").unwrap();
        assert!(!config.modules.default_check_loading);
        assert_eq!(config.core, CoreConfig::default());
    }

    #[test]
    fn test_nested_core_values_are_validated() {
        let err = RuntimeConfig::from_toml_str("[core]\nprocess_tag = 20000\n").unwrap_err();
        assert!(matches!(err, RuntimeError::Core(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_text_is_a_config_error() {
        let err = RuntimeConfig::from_toml_str("[core\n").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = RuntimeConfig::from_file("/nonexistent/kiln.toml").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }
}
