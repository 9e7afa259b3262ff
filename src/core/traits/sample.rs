//! Sample store seams.
//!
//! The pipeline never owns sample storage: it reads each sample's filepath
//! and writes named fields back through the collection's save contract.
//! These traits are the seam an external dataset layer implements.

use crate::core::batch::{Tensor1D, Tensor2D};
use crate::core::errors::PipelineResult;
use crate::domain::{Label, MediaType};
use std::path::Path;

/// A value stored in a named sample field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A label produced by a model.
    Label(Label),
    /// A single embedding row.
    Vector(Tensor1D),
    /// Embeddings stacked along a leading axis (one row per patch).
    VectorStack(Tensor2D),
}

/// One unit of media plus a mutable field store.
///
/// Object-safe so that specialized backends can receive samples without
/// knowing the concrete store type.
pub trait Sample {
    /// A stable unique key for this sample.
    fn id(&self) -> &str;

    /// The path of this sample's media on disk.
    fn filepath(&self) -> &Path;

    /// Reads a named field, if set.
    fn get_field(&self, name: &str) -> Option<&FieldValue>;

    /// Writes a named field. The value is not persisted until
    /// [`Sample::save`] is called.
    fn set_field(&mut self, name: &str, value: FieldValue);

    /// Persists mutated fields.
    fn save(&mut self) -> PipelineResult<()>;
}

/// An ordered, homogeneous collection of samples.
///
/// The collection's media type governs which executor applies; iteration
/// order is the slice order and is preserved by every executor.
pub trait SampleCollection {
    /// The concrete sample type.
    type Sample: Sample;

    /// The media type shared by every sample in the collection.
    fn media_type(&self) -> MediaType;

    /// Mutable access to the samples, in iteration order.
    fn samples_mut(&mut self) -> &mut [Self::Sample];
}
