//! Amortized capacity growth.
//!
//! Small arrays double, which keeps the total copy cost of N appends
//! proportional to N. Large arrays grow by a quarter so the unused tail
//! stays bounded. The result is advisory: the engine still rounds the byte
//! size up to an allocator size class.

use elastic_core::{ArrayError, Operation, Quantity};

use crate::config::EngineConfig;

/// Computes the next capacity for a growing array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    small_threshold: usize,
}

impl GrowthPolicy {
    /// A policy doubling below `small_threshold` elements of length.
    pub fn new(small_threshold: usize) -> Self {
        Self { small_threshold }
    }

    /// The policy described by `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.small_array_threshold)
    }

    /// Length below which capacity doubles.
    pub fn small_threshold(&self) -> usize {
        self.small_threshold
    }

    /// Next capacity for an array of `old_len` elements in `old_cap` slots
    /// that must hold at least `min_cap` elements.
    ///
    /// Fails with `OutOfRange` if `min_cap < old_cap` or `old_len > old_cap`.
    pub fn next_capacity(
        &self,
        old_cap: usize,
        old_len: usize,
        min_cap: usize,
    ) -> Result<usize, ArrayError> {
        if min_cap < old_cap {
            return Err(ArrayError::out_of_range(
                Operation::Grow,
                Quantity::Capacity,
                min_cap,
            ));
        }
        if old_len > old_cap {
            return Err(ArrayError::out_of_range(
                Operation::Grow,
                Quantity::Length,
                old_len,
            ));
        }

        // Doubling cannot reach the target in one step.
        match old_cap.checked_add(old_cap) {
            Some(doubled) if doubled >= min_cap => {}
            _ => return Ok(min_cap),
        }

        let mut candidate = old_cap;
        while candidate < min_cap {
            let step = if old_len < self.small_threshold {
                candidate
            } else {
                (candidate / 4).max(1)
            };
            candidate = match candidate.checked_add(step) {
                Some(next) => next,
                None => return Ok(min_cap),
            };
        }
        Ok(candidate)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new(EngineConfig::DEFAULT_SMALL_ARRAY_THRESHOLD)
    }
}
