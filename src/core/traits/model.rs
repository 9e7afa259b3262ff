//! Model capability traits.
//!
//! A model is an externally constructed, caller-owned entity; the pipeline
//! borrows it for the duration of a run and queries its capabilities without
//! invoking inference. Each capability is a separate trait layered over the
//! minimal required methods, with overridable defaults:
//!
//! - [`Model`] is the predictor capability (single-item and batched
//!   prediction, setup/teardown, the ragged-batches flag, and an optional
//!   specialized backend).
//! - [`EmbeddingsModel`] is the embeddings capability, defaulting `embed` to
//!   "predict, then read the last-computed embeddings".
//! - [`SpecializedBackend`] is an externally managed batched path that
//!   bypasses the pipeline's own batching entirely.

use crate::core::batch::Tensor2D;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::reader::VideoStream;
use crate::core::traits::sample::Sample;
use crate::domain::{Label, MediaType};
use image::RgbImage;
use ndarray::Axis;
use std::collections::HashMap;

/// One unit of decoded media handed to a model.
///
/// Image models receive a borrowed RGB buffer; video models receive an open
/// frame-sequential stream which they consume in a single pass.
pub enum ModelInput<'a> {
    /// A decoded image.
    Image(&'a RgbImage),
    /// An open video stream.
    Video(&'a mut dyn VideoStream),
}

impl std::fmt::Debug for ModelInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelInput::Image(img) => {
                let (w, h) = img.dimensions();
                write!(f, "ModelInput::Image({w}x{h})")
            }
            ModelInput::Video(_) => write!(f, "ModelInput::Video"),
        }
    }
}

/// The predictor capability.
///
/// Implementations receive decoded media and produce [`Label`]s. The
/// pipeline brackets every run between [`Model::setup`] and
/// [`Model::teardown`] via a scoped acquisition; implementations can use
/// those hooks to allocate and release inference resources.
pub trait Model {
    /// Acquires any resources needed for inference.
    ///
    /// Called once before the first item of a run.
    fn setup(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    /// Releases resources acquired by [`Model::setup`].
    ///
    /// Called once after the last item, on every exit path.
    fn teardown(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    /// Performs prediction on a single unit of media.
    ///
    /// # Arguments
    ///
    /// * `input` - The decoded media.
    ///
    /// # Returns
    ///
    /// The predicted label, or an inference error.
    fn predict(&mut self, input: ModelInput<'_>) -> PipelineResult<Label>;

    /// Performs prediction on a batch of media.
    ///
    /// Implementations can override this to run a true batched forward
    /// pass; by default it applies [`Model::predict`] element-wise, in
    /// order.
    ///
    /// # Arguments
    ///
    /// * `inputs` - The decoded media, in input order.
    ///
    /// # Returns
    ///
    /// One label per input, in input order.
    fn predict_all(&mut self, inputs: Vec<ModelInput<'_>>) -> PipelineResult<Vec<Label>> {
        inputs.into_iter().map(|input| self.predict(input)).collect()
    }

    /// Whether per-item outputs may have different shapes, which forbids
    /// batched tensor construction. Queried, never negotiated.
    fn ragged_batches(&self) -> bool {
        false
    }

    /// Whether this model accepts the given media type.
    ///
    /// The router fails fast with a media-type mismatch when the collection
    /// does not satisfy this. Defaults to image-only.
    fn supports_media(&self, media_type: MediaType) -> bool {
        media_type == MediaType::Image
    }

    /// An externally managed, optimized batched path, if this model has one.
    ///
    /// When present, the router delegates the whole operation to the backend
    /// instead of running the pipeline's own batching.
    fn specialized_backend(&mut self) -> Option<&mut dyn SpecializedBackend> {
        None
    }
}

/// The embeddings capability.
///
/// A model may implement this trait yet not expose embeddings for a given
/// configuration; the pipeline queries [`EmbeddingsModel::has_embeddings`]
/// before any work and fails fast when it returns false.
pub trait EmbeddingsModel: Model {
    /// Whether this instance exposes embeddings.
    fn has_embeddings(&self) -> bool {
        true
    }

    /// Returns the embeddings computed by the last forward pass.
    ///
    /// By convention the first axis is the batch size of that pass (always
    /// 1 after a [`Model::predict`] call).
    fn last_embeddings(&self) -> Option<Tensor2D>;

    /// Generates an embedding for a single unit of media.
    ///
    /// By default this predicts and then reads the last-computed
    /// embeddings; implementations can override it for efficiency.
    ///
    /// # Arguments
    ///
    /// * `input` - The decoded media.
    ///
    /// # Returns
    ///
    /// A `(1, d)` array holding the embedding.
    fn embed(&mut self, input: ModelInput<'_>) -> PipelineResult<Tensor2D> {
        self.predict(input)?;
        self.last_embeddings().ok_or_else(|| {
            PipelineError::capability_mismatch(
                "model produced no embeddings on its last forward pass",
            )
        })
    }

    /// Generates embeddings for a batch of media.
    ///
    /// By default this applies [`EmbeddingsModel::embed`] element-wise and
    /// stacks the results along a new leading axis.
    ///
    /// # Arguments
    ///
    /// * `inputs` - The decoded media, in input order.
    ///
    /// # Returns
    ///
    /// A `(k, d)` array with one row per input, in input order.
    fn embed_all(&mut self, inputs: Vec<ModelInput<'_>>) -> PipelineResult<Tensor2D> {
        let mut parts = Vec::with_capacity(inputs.len());
        for input in inputs {
            parts.push(self.embed(input)?);
        }

        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        Ok(ndarray::concatenate(Axis(0), &views)?)
    }
}

/// An operation delegated wholesale to a specialized backend.
pub enum BackendRequest<'a> {
    /// Apply the model and write labels to `label_field`.
    ApplyModel {
        /// The samples to process, in input order.
        samples: Vec<&'a mut dyn Sample>,
        /// The field (or field-name prefix) to write labels into.
        label_field: &'a str,
        /// Optional confidence threshold applied before writing.
        confidence_thresh: Option<f64>,
        /// The caller-requested batch size, if any.
        batch_size: Option<usize>,
    },
    /// Compute one embedding per sample.
    ComputeEmbeddings {
        /// The samples to process, in input order.
        samples: Vec<&'a mut dyn Sample>,
        /// The field to write embeddings into, or None to return them.
        embeddings_field: Option<&'a str>,
        /// The caller-requested batch size, if any.
        batch_size: Option<usize>,
    },
    /// Compute embeddings for the patches of each sample.
    ComputePatchEmbeddings {
        /// The samples to process, in input order.
        samples: Vec<&'a mut dyn Sample>,
        /// The field holding the patch source labels.
        patches_field: &'a str,
        /// The field to write embeddings into, or None to return them.
        embeddings_field: Option<&'a str>,
        /// The caller-requested batch size, if any.
        batch_size: Option<usize>,
    },
}

/// The result of a specialized-backend run.
pub enum BackendResponse {
    /// The operation wrote all of its results to sample fields.
    Done,
    /// In-memory embeddings, one row per sample in input order.
    Embeddings(Tensor2D),
    /// In-memory patch embeddings keyed by sample id.
    PatchEmbeddings(HashMap<String, Tensor2D>),
}

/// An externally managed, optimized batched inference path.
///
/// The pipeline treats a backend run as a single blocking operation; any
/// internal parallelism or prefetching is the backend's own concern.
pub trait SpecializedBackend {
    /// Runs the requested operation end to end.
    fn run(&mut self, request: BackendRequest<'_>) -> PipelineResult<BackendResponse>;
}
