//! # Module Configuration

use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};

/// Settings for the module lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Stop the load pipeline at the first phase that reports `false`,
    /// unless a module overrides it.
    pub default_check_loading: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            default_check_loading: true,
        }
    }
}

impl ModuleConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// `Failed` with the parser message when the text does not match.
    pub fn from_toml_str(text: &str) -> ModuleResult<Self> {
        toml::from_str(text).map_err(|e| ModuleError::Failed(format!("invalid configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gating_is_on_by_default() {
        assert!(ModuleConfig::default().default_check_loading);
        assert!(ModuleConfig::from_toml_str("").unwrap().default_check_loading);
    }

    #[test]
    fn test_gating_can_be_disabled() {
        let config = ModuleConfig::from_toml_str("default_check_loading = false").unwrap();
        assert!(!config.default_check_loading);
    }
}
