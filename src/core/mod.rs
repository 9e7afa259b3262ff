//! The core module of the pipeline.
//!
//! This module contains the fundamental components of the model-application
//! pipeline:
//! - Batch-size negotiation and batch sampling
//! - Configuration management
//! - Error handling
//! - Media decoding seams
//! - Traits defining the model and sample-store contracts
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod batch;
pub mod config;
pub mod constants;
pub mod errors;
pub mod reader;
pub mod traits;

pub use batch::{concat_embeddings, negotiate_batch_size, BatchSampler, Tensor1D, Tensor2D};
pub use config::PipelineConfig;
pub use errors::{PipelineError, PipelineResult};
pub use reader::{FsMediaReader, MediaReader, ScopedStream, VideoStream};
pub use traits::{
    BackendRequest, BackendResponse, EmbeddingsModel, FieldValue, Model, ModelInput, Sample,
    SampleCollection, SpecializedBackend,
};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
