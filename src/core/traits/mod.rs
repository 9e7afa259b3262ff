//! Traits defining the pipeline's external seams.
//!
//! Models, samples, and media decoding are all external collaborators; the
//! traits in this module are the contracts they satisfy.

pub mod model;
pub mod sample;

pub use model::{
    BackendRequest, BackendResponse, EmbeddingsModel, Model, ModelInput, SpecializedBackend,
};
pub use sample::{FieldValue, Sample, SampleCollection};
