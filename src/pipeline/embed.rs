//! Embedding executors.
//!
//! These executors produce one embedding per sample, either written to a
//! named field (the per-sample embedding row) or accumulated and returned
//! as a single array stacked in sample order.

use crate::core::batch::{concat_embeddings, BatchSampler, Tensor2D};
use crate::core::errors::PipelineResult;
use crate::core::reader::{MediaReader, ScopedStream};
use crate::core::traits::{EmbeddingsModel, FieldValue, ModelInput, Sample};
use crate::pipeline::guard::ModelGuard;
use crate::pipeline::progress::Progress;
use std::path::Path;

/// Combines accumulated per-batch embeddings into the in-memory result.
///
/// An empty collection yields an empty `(0, 0)` array rather than an error.
fn collect_embeddings(parts: Vec<Tensor2D>) -> PipelineResult<Option<Tensor2D>> {
    if parts.is_empty() {
        return Ok(Some(Tensor2D::zeros((0, 0))));
    }
    concat_embeddings(&parts).map(Some)
}

/// Computes image embeddings one sample at a time.
pub(crate) fn embed_images_single<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    embeddings_field: Option<&str>,
) -> PipelineResult<Option<Tensor2D>>
where
    S: Sample,
    M: EmbeddingsModel + ?Sized,
{
    let mut guard = ModelGuard::new(model)?;
    let mut parts = Vec::new();
    progress.begin(Some(samples.len()));

    for sample in samples.iter_mut() {
        let img = reader.decode_image(sample.filepath())?;
        let embedding = guard.embed(ModelInput::Image(&img))?;

        match embeddings_field {
            Some(field) => {
                sample.set_field(field, FieldValue::Vector(embedding.row(0).to_owned()));
                sample.save()?;
            }
            None => parts.push(embedding),
        }

        progress.advance(1);
    }

    progress.finish();
    guard.finish()?;

    if embeddings_field.is_some() {
        Ok(None)
    } else {
        collect_embeddings(parts)
    }
}

/// Computes image embeddings in contiguous batches of the negotiated size.
pub(crate) fn embed_images_batch<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    embeddings_field: Option<&str>,
    batch_size: usize,
    parallel_threshold: usize,
) -> PipelineResult<Option<Tensor2D>>
where
    S: Sample,
    M: EmbeddingsModel + ?Sized,
{
    let sampler = BatchSampler::new(batch_size)?;
    let mut guard = ModelGuard::new(model)?;
    let mut parts = Vec::new();
    progress.begin(Some(samples.len()));

    for batch in sampler.batches_mut(samples) {
        let paths: Vec<&Path> = batch.iter().map(|s| s.filepath()).collect();
        let imgs = reader.decode_images(&paths, parallel_threshold)?;

        let inputs: Vec<ModelInput<'_>> = imgs.iter().map(ModelInput::Image).collect();
        let embeddings = guard.embed_all(inputs)?;

        match embeddings_field {
            Some(field) => {
                for (sample, row) in batch.iter_mut().zip(embeddings.outer_iter()) {
                    sample.set_field(field, FieldValue::Vector(row.to_owned()));
                    sample.save()?;
                }
            }
            None => parts.push(embeddings),
        }

        progress.advance(imgs.len());
    }

    progress.finish();
    guard.finish()?;

    if embeddings_field.is_some() {
        Ok(None)
    } else {
        collect_embeddings(parts)
    }
}

/// Computes video embeddings one sample at a time.
pub(crate) fn embed_video<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    embeddings_field: Option<&str>,
) -> PipelineResult<Option<Tensor2D>>
where
    S: Sample,
    M: EmbeddingsModel + ?Sized,
{
    let mut guard = ModelGuard::new(model)?;
    let mut parts = Vec::new();
    progress.begin(Some(samples.len()));

    for sample in samples.iter_mut() {
        let mut stream = ScopedStream::new(reader.open_video(sample.filepath())?);
        let embedding = guard.embed(ModelInput::Video(&mut *stream))?;
        stream.close()?;

        match embeddings_field {
            Some(field) => {
                sample.set_field(field, FieldValue::Vector(embedding.row(0).to_owned()));
                sample.save()?;
            }
            None => parts.push(embedding),
        }

        progress.advance(1);
    }

    progress.finish();
    guard.finish()?;

    if embeddings_field.is_some() {
        Ok(None)
    } else {
        collect_embeddings(parts)
    }
}
