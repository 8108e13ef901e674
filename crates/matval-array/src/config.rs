//! Engine configuration
//!
//! Knobs that change how containers and values behave at a few decision
//! points (interrupt polling, lazy ranges, sparse auto-conversion, display).

use log::warn;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Configuration for the array and value layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Elements processed between cancellation checks in hot loops
    pub interrupt_poll_interval: usize,

    /// Keep range results lazy; when false they are materialized on creation
    pub lazy_ranges: bool,

    /// Convert sparse results to full storage when that would be smaller
    pub sparse_auto_mutate: bool,

    /// Significant digits used when displaying values (1..=16)
    pub output_precision: usize,

    /// Truncate non-integer ranges used as subscripts instead of rejecting them
    pub allow_noninteger_range_index: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interrupt_poll_interval: 4096,
            lazy_ranges: true,
            sparse_auto_mutate: false,
            output_precision: 5,
            allow_noninteger_range_index: false,
        }
    }
}

impl EngineConfig {
    /// Poll for cancellation on every element and keep every result eager
    pub fn debug() -> Self {
        Self {
            interrupt_poll_interval: 1,
            lazy_ranges: false,
            ..Default::default()
        }
    }

    /// Prefer dense results whenever they are at least as small
    pub fn dense_results() -> Self {
        Self {
            sparse_auto_mutate: true,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interrupt_poll_interval == 0 {
            return Err("Interrupt poll interval must be > 0".to_string());
        }

        if !(1..=16).contains(&self.output_precision) {
            return Err("Output precision must be between 1 and 16".to_string());
        }

        Ok(())
    }
}

/// Environment variable-based configuration builder
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut builder = Self::new();

        if let Ok(val) = std::env::var("MATVAL_INTERRUPT_POLL") {
            if let Ok(interval) = val.parse::<usize>() {
                builder.config.interrupt_poll_interval = interval;
            }
        }

        if let Ok(val) = std::env::var("MATVAL_LAZY_RANGES") {
            builder.config.lazy_ranges = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("MATVAL_SPARSE_AUTO_MUTATE") {
            builder.config.sparse_auto_mutate = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("MATVAL_OUTPUT_PRECISION") {
            if let Ok(digits) = val.parse::<usize>() {
                builder.config.output_precision = digits;
            }
        }

        if let Ok(val) = std::env::var("MATVAL_NONINT_RANGE_INDEX") {
            builder.config.allow_noninteger_range_index = parse_flag(&val);
        }

        builder
    }

    pub fn interrupt_poll_interval(mut self, interval: usize) -> Self {
        self.config.interrupt_poll_interval = interval;
        self
    }

    pub fn lazy_ranges(mut self, enable: bool) -> Self {
        self.config.lazy_ranges = enable;
        self
    }

    pub fn sparse_auto_mutate(mut self, enable: bool) -> Self {
        self.config.sparse_auto_mutate = enable;
        self
    }

    pub fn output_precision(mut self, digits: usize) -> Self {
        self.config.output_precision = digits;
        self
    }

    pub fn allow_noninteger_range_index(mut self, enable: bool) -> Self {
        self.config.allow_noninteger_range_index = enable;
        self
    }

    pub fn build(self) -> Result<EngineConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> = Lazy::new(|| {
    let config = EngineConfigBuilder::from_env().build().unwrap_or_else(|err| {
        warn!("ignoring engine configuration from environment: {err}");
        EngineConfig::default()
    });
    RwLock::new(config)
});

/// Snapshot of the active configuration.
pub fn engine_config() -> EngineConfig {
    ENGINE_CONFIG.read().clone()
}

/// Replace the active configuration.
pub fn set_engine_config(config: EngineConfig) -> Result<(), String> {
    config.validate()?;
    *ENGINE_CONFIG.write() = config;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_preset_configs_valid() {
        assert!(EngineConfig::debug().validate().is_ok());
        assert!(EngineConfig::dense_results().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.interrupt_poll_interval = 0;
        assert!(config.validate().is_err());
        config.interrupt_poll_interval = 16;

        config.output_precision = 0;
        assert!(config.validate().is_err());
        config.output_precision = 17;
        assert!(config.validate().is_err());
        config.output_precision = 10;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfigBuilder::new()
            .interrupt_poll_interval(64)
            .lazy_ranges(false)
            .output_precision(8)
            .build()
            .expect("should build valid config");

        assert_eq!(config.interrupt_poll_interval, 64);
        assert!(!config.lazy_ranges);
        assert_eq!(config.output_precision, 8);
    }

    #[test]
    fn test_builder_rejects_invalid() {
        assert!(EngineConfigBuilder::new()
            .interrupt_poll_interval(0)
            .build()
            .is_err());
    }
}
