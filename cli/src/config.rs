//! TOML configuration for the `ledgerseal` CLI.
//!
//! Every key has a default, so a missing file is equivalent to an empty one.
//!
//! ```toml
//! log_filter = "info"
//!
//! [verify]
//! default_partition = "org-42"
//! require_single_partition = true
//! batch_size = 500
//!
//! [demo]
//! partitions = ["org-1", "org-2"]
//! events_per_partition = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use ledgerseal_audit::DEFAULT_BATCH_SIZE;
use ledgerseal_contracts::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// `tracing` filter directive.  `RUST_LOG` takes precedence when set.
    pub log_filter: String,
    pub verify: VerifyConfig,
    pub demo: DemoConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_string(),
            verify: VerifyConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Partition to verify when a plain event array spans several and
    /// `--partition` is not given.
    pub default_partition: Option<String>,

    /// Refuse to guess a partition from a mixed event array.
    pub require_single_partition: bool,

    /// Events fetched per store scan when verifying a whole partition.
    pub batch_size: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            default_partition: None,
            require_single_partition: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub partitions: Vec<String>,
    pub events_per_partition: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            partitions: vec!["org-1".to_string(), "org-2".to_string()],
            events_per_partition: 4,
        }
    }
}

impl LedgerConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `LedgerError::ConfigError` if the TOML is malformed, names an
    /// unknown key, or sets `verify.batch_size` to zero.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> LedgerResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> LedgerResult<()> {
        if self.verify.batch_size == 0 {
            return Err(LedgerError::ConfigError {
                reason: "verify.batch_size must be at least 1".to_string(),
            });
        }
        if self.demo.partitions.iter().any(|p| p.trim().is_empty()) {
            return Err(LedgerError::ConfigError {
                reason: "demo.partitions must not contain blank names".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.log_filter, "warn");
        assert!(config.verify.require_single_partition);
        assert_eq!(config.verify.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn full_document_parses() {
        let toml = r#"
            log_filter = "ledgerseal=debug"

            [verify]
            default_partition = "org-42"
            require_single_partition = false
            batch_size = 50

            [demo]
            partitions = ["acme"]
            events_per_partition = 2
        "#;

        let config = LedgerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.log_filter, "ledgerseal=debug");
        assert_eq!(config.verify.default_partition.as_deref(), Some("org-42"));
        assert!(!config.verify.require_single_partition);
        assert_eq!(config.verify.batch_size, 50);
        assert_eq!(config.demo.partitions, vec!["acme".to_string()]);
        assert_eq!(config.demo.events_per_partition, 2);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = LedgerConfig::from_toml_str("[verify]\nbatch_size = 10\n").unwrap();
        assert_eq!(config.verify.batch_size, 10);
        assert!(config.verify.require_single_partition);
        assert_eq!(config.demo, DemoConfig::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = LedgerConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError { .. }));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = LedgerConfig::from_toml_str("[verify]\nbatch_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = LedgerConfig::from_file(Path::new("/nonexistent/ledgerseal.toml")).unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError { .. }));
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(LedgerConfig::load(None).unwrap(), LedgerConfig::default());
    }
}
