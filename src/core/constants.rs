//! Constants used throughout the pipeline.

/// Default threshold above which batched image loading switches to parallel
/// decoding via rayon.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;
