//! Patch embedding executor.
//!
//! Produces one embedding per detected region of interest for every image
//! sample in a collection. Each sample's image is decoded once and reused
//! for all of its patches; patches from one sample may be batched together,
//! but a batch never spans multiple samples.

use crate::core::batch::{concat_embeddings, BatchSampler, Tensor2D};
use crate::core::errors::{PipelineError, PipelineResult};
use crate::core::reader::MediaReader;
use crate::core::traits::{EmbeddingsModel, FieldValue, ModelInput, Sample};
use crate::domain::{Detections, Label};
use crate::pipeline::guard::ModelGuard;
use crate::pipeline::progress::Progress;
use crate::processors::PatchExtractor;
use image::RgbImage;
use std::collections::HashMap;

/// Resolves a sample's patch source field to a detections container.
///
/// Supported source types are Detection, Detections, Polyline, and
/// Polylines; singular forms become one-element containers and polylines
/// are converted via their bounding boxes. A missing field resolves to
/// None; a field of any other type is invalid input.
pub(crate) fn resolve_patches<S: Sample>(
    sample: &S,
    patches_field: &str,
) -> PipelineResult<Option<Detections>> {
    let Some(value) = sample.get_field(patches_field) else {
        return Ok(None);
    };

    let FieldValue::Label(label) = value else {
        return Err(PipelineError::invalid_input(format!(
            "field '{patches_field}' of sample '{}' does not hold a label",
            sample.id()
        )));
    };

    match label {
        Label::Detections(detections) => Ok(Some(detections.clone())),
        Label::Detection(detection) => Ok(Some(Detections::new(vec![detection.clone()]))),
        Label::Polyline(polyline) => Ok(Some(Detections::new(vec![polyline.to_detection()]))),
        Label::Polylines(polylines) => Ok(Some(polylines.to_detections())),
        other => Err(PipelineError::invalid_input(format!(
            "field '{patches_field}' of sample '{}' holds an unsupported patch source: {other:?}",
            sample.id()
        ))),
    }
}

/// Embeds every patch of one sample, one patch at a time.
fn embed_sample_patches_single<M>(
    guard: &mut ModelGuard<'_, M>,
    img: &RgbImage,
    detections: &Detections,
    extractor: &PatchExtractor,
) -> PipelineResult<Tensor2D>
where
    M: EmbeddingsModel + ?Sized,
{
    let mut parts = Vec::with_capacity(detections.len());
    for detection in &detections.detections {
        let patch = extractor.extract(img, detection)?;
        parts.push(guard.embed(ModelInput::Image(&patch))?);
    }

    concat_embeddings(&parts)
}

/// Embeds every patch of one sample in contiguous batches.
fn embed_sample_patches_batch<M>(
    guard: &mut ModelGuard<'_, M>,
    img: &RgbImage,
    detections: &Detections,
    extractor: &PatchExtractor,
    batch_size: usize,
) -> PipelineResult<Tensor2D>
where
    M: EmbeddingsModel + ?Sized,
{
    let sampler = BatchSampler::new(batch_size)?;
    let mut parts = Vec::new();

    for detection_batch in sampler.batches(&detections.detections) {
        let patches = detection_batch
            .iter()
            .map(|d| extractor.extract(img, d))
            .collect::<PipelineResult<Vec<_>>>()?;

        let inputs: Vec<ModelInput<'_>> = patches.iter().map(ModelInput::Image).collect();
        parts.push(guard.embed_all(inputs)?);
    }

    concat_embeddings(&parts)
}

/// Computes embeddings for the patches of every sample in a collection.
///
/// A sample whose patch source yields no detections contributes no output
/// at all: no field write and no entry in the returned mapping.
#[allow(clippy::too_many_arguments)]
pub(crate) fn embed_patches<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    patches_field: &str,
    embeddings_field: Option<&str>,
    batch_size: Option<usize>,
    extractor: &PatchExtractor,
) -> PipelineResult<Option<HashMap<String, Tensor2D>>>
where
    S: Sample,
    M: EmbeddingsModel + ?Sized,
{
    let mut guard = ModelGuard::new(model)?;
    let mut embeddings_map = HashMap::new();
    progress.begin(Some(samples.len()));

    for sample in samples.iter_mut() {
        let detections = resolve_patches(sample, patches_field)?;
        let Some(detections) = detections.filter(|d| !d.is_empty()) else {
            progress.advance(1);
            continue;
        };

        // Decode once per sample; every patch crops the same buffer.
        let img = reader.decode_image(sample.filepath())?;

        let embeddings = match batch_size {
            None => embed_sample_patches_single(&mut guard, &img, &detections, extractor)?,
            Some(batch_size) => {
                embed_sample_patches_batch(&mut guard, &img, &detections, extractor, batch_size)?
            }
        };

        match embeddings_field {
            Some(field) => {
                sample.set_field(field, FieldValue::VectorStack(embeddings));
                sample.save()?;
            }
            None => {
                embeddings_map.insert(sample.id().to_string(), embeddings);
            }
        }

        progress.advance(1);
    }

    progress.finish();
    guard.finish()?;

    if embeddings_field.is_some() {
        Ok(None)
    } else {
        Ok(Some(embeddings_map))
    }
}
