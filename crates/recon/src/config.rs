//! Run configuration, loadable from a TOML file.
//!
//! Everything has a default, so an empty file (or no file) is a valid
//! configuration. Parsing and validation are separate steps: `from_toml`
//! only deserializes, `validate` applies the semantic checks.

use serde::Deserialize;

use crate::error::ReconError;

/// Difference magnitude up to which a group still counts as reconciled.
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Cell text that marks the ledger header row in SIAFI exports.
pub const DEFAULT_HEADER_LABEL: &str = "Nat Desp";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reconciliation: ReconciliationConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    pub tolerance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub header_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reconciliation: ReconciliationConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        ReconciliationConfig {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            header_label: DEFAULT_HEADER_LABEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ReconError> {
        let config: Config =
            toml::from_str(text).map_err(|err| ReconError::ConfigParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let tolerance = self.reconciliation.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "reconciliation.tolerance must be a finite value >= 0, got {tolerance}"
            )));
        }
        if self.ledger.header_label.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "ledger.header_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_the_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.reconciliation.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.ledger.header_label, DEFAULT_HEADER_LABEL);
    }

    #[test]
    fn sections_can_be_set_independently() {
        let config = Config::from_toml("[reconciliation]\ntolerance = 0.5\n").unwrap();
        assert_eq!(config.reconciliation.tolerance, 0.5);
        assert_eq!(config.ledger.header_label, DEFAULT_HEADER_LABEL);

        let config = Config::from_toml("[ledger]\nheader_label = \"Conta\"\n").unwrap();
        assert_eq!(config.reconciliation.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.ledger.header_label, "Conta");
    }

    #[test]
    fn zero_tolerance_is_allowed() {
        let config = Config::from_toml("[reconciliation]\ntolerance = 0.0\n").unwrap();
        assert_eq!(config.reconciliation.tolerance, 0.0);
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = Config::from_toml("[reconciliation]\ntolerance = -0.1\n").unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn non_finite_tolerance_is_rejected() {
        assert!(Config::from_toml("[reconciliation]\ntolerance = inf\n").is_err());
        assert!(Config::from_toml("[reconciliation]\ntolerance = nan\n").is_err());
    }

    #[test]
    fn blank_header_label_is_rejected() {
        let err = Config::from_toml("[ledger]\nheader_label = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("header_label"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml("[reconciliation\ntolerance = 1").unwrap_err();
        assert!(err.to_string().contains("config parse error"));
    }
}
