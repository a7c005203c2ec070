use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ParseError;

/// Limits and strictness switches for the validator.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Deepest filter tree accepted; a single leaf has depth 1
    pub max_filter_depth: usize,
    /// Upper bound on `timeDimensions` entries; unbounded when `None`
    pub max_time_dimensions: Option<usize>,
    /// Upper bound on `limit`; unbounded when `None`
    pub max_limit: Option<u64>,
    /// Reject top-level keys outside the query grammar instead of ignoring them
    pub reject_unknown_keys: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_filter_depth: 16,
            max_time_dimensions: None,
            max_limit: None,
            reject_unknown_keys: false,
        }
    }
}

impl ValidatorConfig {
    /// Load a config from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        crate::parser::parse_config_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config: ValidatorConfig =
            serde_yaml::from_str("max_limit: 5000\nreject_unknown_keys: true\n").unwrap();
        assert_eq!(config.max_limit, Some(5000));
        assert!(config.reject_unknown_keys);
        assert_eq!(config.max_filter_depth, 16);
        assert_eq!(config.max_time_dimensions, None);
    }

    #[test]
    fn test_unknown_config_key_is_rejected() {
        let result: Result<ValidatorConfig, _> = serde_yaml::from_str("max_depth: 3\n");
        assert!(result.is_err());
    }
}
