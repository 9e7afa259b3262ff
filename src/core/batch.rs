//! Batch processing utilities for the pipeline.
//!
//! This module provides the batch-size negotiation policy, a sampler that
//! partitions a sample sequence into contiguous batches, and the tensor
//! aggregation helpers used to combine per-batch embeddings.

use crate::core::config::PipelineConfig;
use crate::core::errors::{PipelineError, PipelineResult};
use ndarray::Axis;
use tracing::warn;

/// A 1-dimensional tensor of f32 values (a single embedding row).
pub type Tensor1D = ndarray::Array1<f32>;

/// A 2-dimensional tensor of f32 values (embeddings stacked along axis 0).
pub type Tensor2D = ndarray::Array2<f32>;

/// Resolves the batch size to use for an image-model run.
///
/// Policy:
/// 1. If no batch size is requested, the process-wide default from the
///    configuration is used (possibly absent, meaning "no batching").
/// 2. A resolved batch size of zero is invalid input.
/// 3. If the resolved batch size is greater than 1 and the model declares
///    ragged batches, batching is infeasible: a warning is emitted and the
///    single-item path is used instead.
///
/// Video and specialized-backend models never consult this policy.
///
/// # Arguments
///
/// * `requested` - The caller-requested batch size, if any.
/// * `ragged_batches` - Whether the model produces ragged per-item outputs.
/// * `config` - The pipeline configuration holding the default batch size.
///
/// # Returns
///
/// A concrete batch size >= 1, or None for single-item processing.
pub fn negotiate_batch_size(
    requested: Option<usize>,
    ragged_batches: bool,
    config: &PipelineConfig,
) -> PipelineResult<Option<usize>> {
    let resolved = requested.or(config.default_batch_size);

    match resolved {
        Some(0) => Err(PipelineError::invalid_input("batch size must be >= 1")),
        Some(n) if n > 1 && ragged_batches => {
            warn!("model does not support batching (ragged batches); falling back to unbatched");
            Ok(None)
        }
        other => Ok(other),
    }
}

/// A sampler that partitions a sequence into contiguous batches.
///
/// Batch boundaries are purely a throughput mechanism: the sampler never
/// reorders items, and the last batch may be shorter than the batch size.
#[derive(Debug)]
pub struct BatchSampler {
    /// The size of each batch.
    batch_size: usize,
}

impl BatchSampler {
    /// Creates a new BatchSampler with the specified batch size.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - The size of each batch; must be >= 1.
    ///
    /// # Returns
    ///
    /// A new BatchSampler, or invalid input for a zero batch size.
    pub fn new(batch_size: usize) -> PipelineResult<Self> {
        if batch_size == 0 {
            return Err(PipelineError::invalid_input("batch size must be >= 1"));
        }
        Ok(Self { batch_size })
    }

    /// Returns the batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Creates an iterator over contiguous batches of data.
    ///
    /// # Arguments
    ///
    /// * `data` - A slice of data to be batched.
    ///
    /// # Returns
    ///
    /// An iterator over batches in input order; the last batch may be
    /// shorter than the batch size.
    pub fn batches<'a, T>(&self, data: &'a [T]) -> impl Iterator<Item = &'a [T]> {
        data.chunks(self.batch_size)
    }

    /// Creates an iterator over contiguous mutable batches of data.
    ///
    /// # Arguments
    ///
    /// * `data` - A mutable slice of data to be batched.
    ///
    /// # Returns
    ///
    /// An iterator over mutable batches in input order.
    pub fn batches_mut<'a, T>(&self, data: &'a mut [T]) -> impl Iterator<Item = &'a mut [T]> {
        data.chunks_mut(self.batch_size)
    }
}

/// Concatenates per-batch embedding arrays along axis 0.
///
/// Every part must have the same embedding dimension (axis 1); the output
/// row order equals the concatenation order of the parts.
///
/// # Arguments
///
/// * `parts` - The embedding arrays to combine, in order.
///
/// # Returns
///
/// A single array whose first dimension is the total row count, or an error
/// if the parts are empty or dimensionally incompatible.
pub fn concat_embeddings(parts: &[Tensor2D]) -> PipelineResult<Tensor2D> {
    if parts.is_empty() {
        return Err(PipelineError::invalid_input(
            "no embeddings to concatenate",
        ));
    }

    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    Ok(ndarray::concatenate(Axis(0), &views)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_negotiate_prefers_requested_over_default() {
        let config = PipelineConfig::new().with_default_batch_size(Some(8));
        let resolved = negotiate_batch_size(Some(2), false, &config).unwrap();
        assert_eq!(resolved, Some(2));
    }

    #[test]
    fn test_negotiate_falls_back_to_config_default() {
        let config = PipelineConfig::new().with_default_batch_size(Some(8));
        let resolved = negotiate_batch_size(None, false, &config).unwrap();
        assert_eq!(resolved, Some(8));
    }

    #[test]
    fn test_negotiate_no_batching_when_nothing_configured() {
        let config = PipelineConfig::default();
        let resolved = negotiate_batch_size(None, false, &config).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_negotiate_downgrades_ragged_models() {
        let config = PipelineConfig::default();
        let resolved = negotiate_batch_size(Some(4), true, &config).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_negotiate_keeps_size_one_for_ragged_models() {
        let config = PipelineConfig::default();
        let resolved = negotiate_batch_size(Some(1), true, &config).unwrap();
        assert_eq!(resolved, Some(1));
    }

    #[test]
    fn test_negotiate_rejects_zero() {
        let config = PipelineConfig::default();
        assert!(negotiate_batch_size(Some(0), false, &config).is_err());
    }

    #[test]
    fn test_batch_sampler_last_batch_short() {
        let sampler = BatchSampler::new(2).unwrap();
        let data = [1, 2, 3];
        let batches: Vec<&[i32]> = sampler.batches(&data).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], &[1, 2]);
        assert_eq!(batches[1], &[3]);
    }

    #[test]
    fn test_batch_sampler_rejects_zero() {
        assert!(BatchSampler::new(0).is_err());
    }

    #[test]
    fn test_concat_embeddings_row_order() {
        let a = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let b = array![[5.0_f32, 6.0]];
        let combined = concat_embeddings(&[a, b]).unwrap();
        assert_eq!(combined.shape(), &[3, 2]);
        assert_eq!(combined[[2, 0]], 5.0);
    }

    #[test]
    fn test_concat_embeddings_rejects_empty() {
        assert!(concat_embeddings(&[]).is_err());
    }

    #[test]
    fn test_concat_embeddings_rejects_mismatched_dims() {
        let a = array![[1.0_f32, 2.0]];
        let b = array![[1.0_f32, 2.0, 3.0]];
        assert!(concat_embeddings(&[a, b]).is_err());
    }
}
