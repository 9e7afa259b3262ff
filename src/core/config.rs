//! Pipeline configuration.
//!
//! This module provides the process-wide configuration consumed by the
//! pipeline. The configuration is constructed explicitly at startup and
//! passed by reference into the pipeline; it is never read as a global and
//! never mutated during a run.

use crate::core::constants::DEFAULT_PARALLEL_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Process-wide configuration for the model-application pipeline.
///
/// The `default_batch_size` is consulted by the batch-size negotiator
/// whenever a caller does not request an explicit batch size. `None` means
/// "no batching": samples are processed one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Default batch size to use when none is requested.
    /// If None, unbatched single-item processing is used.
    #[serde(default)]
    pub default_batch_size: Option<usize>,

    /// Threshold for number of images to decode sequentially (<= this uses
    /// sequential decoding; above it, batched decode goes through rayon).
    #[serde(default = "PipelineConfig::default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl PipelineConfig {
    /// Create a new PipelineConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default batch size.
    pub fn with_default_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.default_batch_size = batch_size;
        self
    }

    /// Set the parallel decode threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    fn default_parallel_threshold() -> usize {
        DEFAULT_PARALLEL_THRESHOLD
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_batch_size: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_unbatched() {
        let config = PipelineConfig::default();
        assert_eq!(config.default_batch_size, None);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::new()
            .with_default_batch_size(Some(8))
            .with_parallel_threshold(16);
        assert_eq!(config.default_batch_size, Some(8));
        assert_eq!(config.parallel_threshold, 16);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_batch_size, None);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    }
}
