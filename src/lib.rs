//! # embedflow
//!
//! A model-application and embedding pipeline for media sample collections.
//!
//! This crate provides:
//! - Capability traits for externally constructed models
//! - A dispatch router that selects an executor from the collection's media
//!   type and the model's declared capabilities
//! - Batch-size negotiation with graceful downgrade to unbatched processing
//! - Patch extraction geometry for region-of-interest embeddings
//! - Materialization of results into sample fields or in memory
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, batching, capability traits,
//!   and the media decoding seams
//! * [`domain`] - Media types and the label taxonomy
//! * [`pipeline`] - The dispatch router and its executors
//! * [`processors`] - Patch extraction geometry
//! * [`utils`] - Image loading utilities
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use embedflow::prelude::*;
//! # use embedflow::core::{Model, SampleCollection};
//! # fn run<C: SampleCollection, M: Model>(
//! #     collection: &mut C,
//! #     model: &mut M,
//! # ) -> PipelineResult<()> {
//! let mut pipeline = Pipeline::new(PipelineConfig::new());
//! pipeline.apply_model(collection, model, &ApplyOptions::new("predictions"))?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{PipelineError, PipelineResult};

    // Configuration and batching
    pub use crate::core::{BatchSampler, PipelineConfig, Tensor1D, Tensor2D};

    // Capability and storage seams
    pub use crate::core::{
        EmbeddingsModel, FieldValue, FsMediaReader, MediaReader, Model, ModelInput, Sample,
        SampleCollection, VideoStream,
    };

    // Domain types
    pub use crate::domain::{
        Classification, Detection, Detections, Label, MediaType, Polyline, Polylines,
    };

    // Patch geometry
    pub use crate::processors::{PatchExtractor, PixelRect};

    // Image utilities
    pub use crate::utils::load_image;

    // Pipeline (high-level API)
    pub use crate::pipeline::{
        ApplyOptions, EmbedOptions, LogProgress, NullProgress, PatchEmbedOptions, Pipeline,
        Progress,
    };
}
