//! The model-application and embedding pipeline.
//!
//! [`Pipeline`] is the dispatch router: it inspects a collection's media
//! type and a model's declared capabilities, selects an executor, and
//! materializes results either into sample fields or in memory.
//!
//! # Example
//!
//! ```rust,no_run
//! use embedflow::core::PipelineConfig;
//! use embedflow::pipeline::{ApplyOptions, Pipeline};
//! # use embedflow::core::{PipelineResult, SampleCollection, Model};
//! # fn run<C: SampleCollection, M: Model>(
//! #     collection: &mut C,
//! #     model: &mut M,
//! # ) -> PipelineResult<()> {
//! let config = PipelineConfig::new().with_default_batch_size(Some(8));
//! let mut pipeline = Pipeline::new(config);
//!
//! pipeline.apply_model(
//!     collection,
//!     model,
//!     &ApplyOptions::new("predictions").with_confidence_thresh(0.5),
//! )?;
//! # Ok(())
//! # }
//! ```

mod apply;
mod embed;
mod guard;
mod patches;
mod progress;


pub use guard::ModelGuard;
pub use progress::{LogProgress, NullProgress, Progress};

use crate::core::batch::{negotiate_batch_size, Tensor2D};
use crate::core::config::PipelineConfig;
use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::reader::{FsMediaReader, MediaReader};
use crate::core::traits::{
    BackendRequest, BackendResponse, EmbeddingsModel, Model, Sample, SampleCollection,
};
use crate::domain::MediaType;
use crate::processors::PatchExtractor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options for [`Pipeline::apply_model`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyOptions {
    /// The field (or field-name prefix, for composite labels) in which to
    /// store the model predictions.
    pub label_field: String,

    /// Optional confidence threshold applied to filter low-confidence
    /// sub-labels before writing.
    #[serde(default)]
    pub confidence_thresh: Option<f64>,

    /// Optional batch size; only applicable to image samples.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl ApplyOptions {
    /// Creates options that write predictions into the given field.
    pub fn new(label_field: impl Into<String>) -> Self {
        Self {
            label_field: label_field.into(),
            confidence_thresh: None,
            batch_size: None,
        }
    }

    /// Set the confidence threshold.
    pub fn with_confidence_thresh(mut self, thresh: f64) -> Self {
        self.confidence_thresh = Some(thresh);
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Options for [`Pipeline::compute_embeddings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedOptions {
    /// The field in which to store per-sample embeddings. If None, the
    /// embeddings are returned in memory instead.
    #[serde(default)]
    pub embeddings_field: Option<String>,

    /// Optional batch size; only applicable to image samples.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl EmbedOptions {
    /// Creates options that return embeddings in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store embeddings in the given field instead of returning them.
    pub fn with_embeddings_field(mut self, field: impl Into<String>) -> Self {
        self.embeddings_field = Some(field.into());
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Options for [`Pipeline::compute_patch_embeddings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchEmbedOptions {
    /// The field holding the patch sources (Detection, Detections,
    /// Polyline, or Polylines) for each sample.
    pub patches_field: String,

    /// The field in which to store per-sample stacked patch embeddings. If
    /// None, a sample-id-keyed mapping is returned instead.
    #[serde(default)]
    pub embeddings_field: Option<String>,

    /// Optional batch size for patches within one sample.
    #[serde(default)]
    pub batch_size: Option<usize>,

    /// Whether to minimally square the patch boxes before extraction.
    #[serde(default)]
    pub force_square: bool,

    /// Optional expansion/contraction factor in `(-1, inf)` applied to the
    /// boxes before extraction.
    #[serde(default)]
    pub alpha: Option<f64>,
}

impl PatchEmbedOptions {
    /// Creates options reading patches from the given field and returning
    /// embeddings in memory.
    pub fn new(patches_field: impl Into<String>) -> Self {
        Self {
            patches_field: patches_field.into(),
            embeddings_field: None,
            batch_size: None,
            force_square: false,
            alpha: None,
        }
    }

    /// Store embeddings in the given field instead of returning them.
    pub fn with_embeddings_field(mut self, field: impl Into<String>) -> Self {
        self.embeddings_field = Some(field.into());
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set whether patch boxes are squared before extraction.
    pub fn with_force_square(mut self, force_square: bool) -> Self {
        self.force_square = force_square;
        self
    }

    /// Set the expansion/contraction factor.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

/// The dispatch router for model application and embedding computation.
///
/// Holds the process-wide configuration, the media decoding seam, and a
/// progress sink. All scheduling is strictly sequential; any parallelism
/// lives inside the external collaborators (parallel batch decode, or a
/// model's specialized backend).
pub struct Pipeline<R: MediaReader = FsMediaReader> {
    config: PipelineConfig,
    reader: R,
    progress: Box<dyn Progress>,
}

impl Pipeline<FsMediaReader> {
    /// Creates a pipeline with filesystem-backed media decoding.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_reader(config, FsMediaReader::new())
    }
}

impl Default for Pipeline<FsMediaReader> {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<R: MediaReader> Pipeline<R> {
    /// Creates a pipeline with a custom media reader.
    pub fn with_reader(config: PipelineConfig, reader: R) -> Self {
        Self {
            config,
            reader,
            progress: Box::new(LogProgress::new()),
        }
    }

    /// Replaces the progress sink.
    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Applies a model to every sample in the collection, writing the
    /// predicted labels into `opts.label_field`.
    ///
    /// Video collections run through the video executor; models with a
    /// specialized backend delegate to it; otherwise the batch size is
    /// negotiated and the batched or single-item executor runs. Success
    /// means every sample was updated, in input order.
    ///
    /// # Arguments
    ///
    /// * `collection` - The samples to process.
    /// * `model` - The model to apply.
    /// * `opts` - Materialization options.
    pub fn apply_model<C, M>(
        &mut self,
        collection: &mut C,
        model: &mut M,
        opts: &ApplyOptions,
    ) -> PipelineResult<()>
    where
        C: SampleCollection,
        M: Model + ?Sized,
    {
        let media_type = collection.media_type();
        check_media_support(model, media_type)?;

        if media_type == MediaType::Video {
            return apply::apply_video_model(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                &opts.label_field,
                opts.confidence_thresh,
            );
        }

        if let Some(backend) = model.specialized_backend() {
            let request = BackendRequest::ApplyModel {
                samples: as_dyn_samples(collection.samples_mut()),
                label_field: &opts.label_field,
                confidence_thresh: opts.confidence_thresh,
                batch_size: opts.batch_size,
            };
            return match backend.run(request)? {
                BackendResponse::Done => Ok(()),
                _ => Err(unexpected_backend_response()),
            };
        }

        match negotiate_batch_size(opts.batch_size, model.ragged_batches(), &self.config)? {
            Some(batch_size) => apply::apply_image_model_batch(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                &opts.label_field,
                opts.confidence_thresh,
                batch_size,
                self.config.parallel_threshold,
            ),
            None => apply::apply_image_model_single(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                &opts.label_field,
                opts.confidence_thresh,
            ),
        }
    }

    /// Computes one embedding per sample in the collection.
    ///
    /// Requires a model whose `has_embeddings` is true; otherwise fails
    /// fast before any media is decoded. With an `embeddings_field`, each
    /// sample's embedding row is written and `None` is returned; otherwise
    /// a `(len(samples), d)` array is returned in input order.
    ///
    /// # Arguments
    ///
    /// * `collection` - The samples to process.
    /// * `model` - The embeddings-capable model.
    /// * `opts` - Materialization options.
    pub fn compute_embeddings<C, M>(
        &mut self,
        collection: &mut C,
        model: &mut M,
        opts: &EmbedOptions,
    ) -> PipelineResult<Option<Tensor2D>>
    where
        C: SampleCollection,
        M: EmbeddingsModel + ?Sized,
    {
        check_has_embeddings(model)?;

        let media_type = collection.media_type();
        check_media_support(model, media_type)?;

        let embeddings_field = opts.embeddings_field.as_deref();

        if media_type == MediaType::Video {
            return embed::embed_video(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                embeddings_field,
            );
        }

        if let Some(backend) = model.specialized_backend() {
            let request = BackendRequest::ComputeEmbeddings {
                samples: as_dyn_samples(collection.samples_mut()),
                embeddings_field,
                batch_size: opts.batch_size,
            };
            return match (backend.run(request)?, embeddings_field) {
                (BackendResponse::Done, Some(_)) => Ok(None),
                (BackendResponse::Embeddings(embeddings), None) => Ok(Some(embeddings)),
                _ => Err(unexpected_backend_response()),
            };
        }

        match negotiate_batch_size(opts.batch_size, model.ragged_batches(), &self.config)? {
            Some(batch_size) => embed::embed_images_batch(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                embeddings_field,
                batch_size,
                self.config.parallel_threshold,
            ),
            None => embed::embed_images_single(
                &self.reader,
                self.progress.as_mut(),
                collection.samples_mut(),
                model,
                embeddings_field,
            ),
        }
    }

    /// Computes embeddings for the image patches defined by
    /// `opts.patches_field` of every sample in the collection.
    ///
    /// Requires image media and a model whose `has_embeddings` is true;
    /// both are validated before any iteration begins. Samples whose patch
    /// source yields no detections are skipped entirely. With an
    /// `embeddings_field`, each sample's stacked patch embeddings are
    /// written and `None` is returned; otherwise a sample-id-keyed mapping
    /// is returned.
    ///
    /// # Arguments
    ///
    /// * `collection` - The samples to process.
    /// * `model` - The embeddings-capable model.
    /// * `opts` - Patch geometry and materialization options.
    pub fn compute_patch_embeddings<C, M>(
        &mut self,
        collection: &mut C,
        model: &mut M,
        opts: &PatchEmbedOptions,
    ) -> PipelineResult<Option<HashMap<String, Tensor2D>>>
    where
        C: SampleCollection,
        M: EmbeddingsModel + ?Sized,
    {
        let media_type = collection.media_type();
        if media_type != MediaType::Image {
            return Err(PipelineError::media_type_mismatch(
                MediaType::Image,
                media_type,
            ));
        }

        check_has_embeddings(model)?;
        check_media_support(model, MediaType::Image)?;

        let embeddings_field = opts.embeddings_field.as_deref();

        if let Some(backend) = model.specialized_backend() {
            let request = BackendRequest::ComputePatchEmbeddings {
                samples: as_dyn_samples(collection.samples_mut()),
                patches_field: &opts.patches_field,
                embeddings_field,
                batch_size: opts.batch_size,
            };
            return match (backend.run(request)?, embeddings_field) {
                (BackendResponse::Done, Some(_)) => Ok(None),
                (BackendResponse::PatchEmbeddings(map), None) => Ok(Some(map)),
                _ => Err(unexpected_backend_response()),
            };
        }

        let extractor = PatchExtractor::new(opts.force_square, opts.alpha)?;
        let batch_size =
            negotiate_batch_size(opts.batch_size, model.ragged_batches(), &self.config)?;

        patches::embed_patches(
            &self.reader,
            self.progress.as_mut(),
            collection.samples_mut(),
            model,
            &opts.patches_field,
            embeddings_field,
            batch_size,
            &extractor,
        )
    }
}

/// Verifies that the model accepts the collection's media type.
fn check_media_support<M: Model + ?Sized>(model: &M, actual: MediaType) -> PipelineResult<()> {
    if model.supports_media(actual) {
        return Ok(());
    }

    let expected = [MediaType::Image, MediaType::Video]
        .into_iter()
        .find(|media_type| model.supports_media(*media_type))
        .ok_or_else(|| {
            PipelineError::capability_mismatch("model does not support any media type")
        })?;

    Err(PipelineError::media_type_mismatch(expected, actual))
}

/// Verifies that the model exposes embeddings at call time.
fn check_has_embeddings<M: EmbeddingsModel + ?Sized>(model: &M) -> PipelineResult<()> {
    if model.has_embeddings() {
        Ok(())
    } else {
        Err(PipelineError::capability_mismatch(
            "model does not expose embeddings (has_embeddings = false)",
        ))
    }
}

fn as_dyn_samples<S: Sample>(samples: &mut [S]) -> Vec<&mut dyn Sample> {
    samples
        .iter_mut()
        .map(|sample| sample as &mut dyn Sample)
        .collect()
}

fn unexpected_backend_response() -> PipelineError {
    PipelineError::invalid_input("specialized backend returned an unexpected response")
}
