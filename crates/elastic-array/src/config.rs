//! Engine configuration parameters.

use elastic_core::ArrayError;

/// Configuration for an [`ArrayEngine`](crate::ArrayEngine).
///
/// Validated at engine construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest byte size any single array may occupy.
    ///
    /// Lengths and capacities whose byte size would exceed this bound are
    /// rejected with `OutOfRange`. Default: 2^40 − 1 on 64-bit targets,
    /// 2^31 − 1 elsewhere.
    pub max_bytes: usize,

    /// Length below which growth doubles capacity.
    ///
    /// At or above this length growth adds a quarter instead, bounding the
    /// unused tail of large arrays. Default: 1024.
    pub small_array_threshold: usize,
}

impl EngineConfig {
    /// Default addressable bound.
    #[cfg(target_pointer_width = "64")]
    pub const DEFAULT_MAX_BYTES: usize = (1 << 40) - 1;

    /// Default addressable bound.
    #[cfg(not(target_pointer_width = "64"))]
    pub const DEFAULT_MAX_BYTES: usize = (1 << 31) - 1;

    /// Default doubling threshold.
    pub const DEFAULT_SMALL_ARRAY_THRESHOLD: usize = 1024;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            small_array_threshold: Self::DEFAULT_SMALL_ARRAY_THRESHOLD,
        }
    }

    /// Override the addressable bound.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ArrayError> {
        if self.max_bytes == 0 {
            return Err(ArrayError::InvalidConfig {
                reason: "max_bytes must be non-zero".to_string(),
            });
        }
        if self.small_array_threshold == 0 {
            return Err(ArrayError::InvalidConfig {
                reason: "small_array_threshold must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert_eq!(config.small_array_threshold, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_max_bytes_rejected() {
        let config = EngineConfig::new().with_max_bytes(0);
        assert!(matches!(
            config.validate(),
            Err(ArrayError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_threshold_rejected() {
        let config = EngineConfig {
            small_array_threshold: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
