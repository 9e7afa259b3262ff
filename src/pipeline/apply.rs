//! Label application executors.
//!
//! These executors iterate a sample sequence in input order, decode each
//! sample's media through the external reader, invoke the model, and write
//! the resulting label(s) back to the sample. The batched executor is purely
//! a throughput mechanism: for deterministic, batch-size-independent models
//! it produces the same per-sample output as the single-item path.

use crate::core::batch::BatchSampler;
use crate::core::errors::PipelineResult;
use crate::core::reader::{MediaReader, ScopedStream};
use crate::core::traits::{FieldValue, Model, ModelInput, Sample};
use crate::domain::Label;
use crate::pipeline::guard::ModelGuard;
use crate::pipeline::progress::Progress;
use std::path::Path;

/// Materializes a label on a sample.
///
/// Applies the optional confidence threshold first; a label that does not
/// survive filtering produces no write at all. Composite labels are written
/// entry-wise under `"{label_field}_{name}"`.
pub(crate) fn write_label<S: Sample>(
    sample: &mut S,
    label: Label,
    label_field: &str,
    confidence_thresh: Option<f64>,
) -> PipelineResult<()> {
    let label = match confidence_thresh {
        Some(thresh) => match label.filter_confidence(thresh) {
            Some(label) => label,
            None => return Ok(()),
        },
        None => label,
    };

    match label {
        Label::Composite(map) => {
            for (name, sub_label) in map {
                sample.set_field(
                    &format!("{label_field}_{name}"),
                    FieldValue::Label(sub_label),
                );
            }
        }
        other => sample.set_field(label_field, FieldValue::Label(other)),
    }

    sample.save()
}

/// Applies an image model one sample at a time.
pub(crate) fn apply_image_model_single<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    label_field: &str,
    confidence_thresh: Option<f64>,
) -> PipelineResult<()>
where
    S: Sample,
    M: Model + ?Sized,
{
    let mut guard = ModelGuard::new(model)?;
    progress.begin(Some(samples.len()));

    for sample in samples.iter_mut() {
        let img = reader.decode_image(sample.filepath())?;
        let label = guard.predict(ModelInput::Image(&img))?;
        write_label(sample, label, label_field, confidence_thresh)?;
        progress.advance(1);
    }

    progress.finish();
    guard.finish()
}

/// Applies an image model in contiguous batches of the negotiated size.
///
/// Every item of a batch is decoded before the model's batched operation is
/// invoked; each element's result is materialized against its originating
/// sample, preserving input order.
pub(crate) fn apply_image_model_batch<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    label_field: &str,
    confidence_thresh: Option<f64>,
    batch_size: usize,
    parallel_threshold: usize,
) -> PipelineResult<()>
where
    S: Sample,
    M: Model + ?Sized,
{
    let sampler = BatchSampler::new(batch_size)?;
    let mut guard = ModelGuard::new(model)?;
    progress.begin(Some(samples.len()));

    for batch in sampler.batches_mut(samples) {
        let paths: Vec<&Path> = batch.iter().map(|s| s.filepath()).collect();
        let imgs = reader.decode_images(&paths, parallel_threshold)?;

        let inputs: Vec<ModelInput<'_>> = imgs.iter().map(ModelInput::Image).collect();
        let labels = guard.predict_all(inputs)?;

        for (sample, label) in batch.iter_mut().zip(labels) {
            write_label(sample, label, label_field, confidence_thresh)?;
        }

        progress.advance(imgs.len());
    }

    progress.finish();
    guard.finish()
}

/// Applies a video model one sample at a time.
///
/// Each sample's media is opened as a frame-sequential stream, passed whole
/// to the model's single-item operation, and released after one full pass.
/// Video is never batched.
pub(crate) fn apply_video_model<S, M>(
    reader: &dyn MediaReader,
    progress: &mut dyn Progress,
    samples: &mut [S],
    model: &mut M,
    label_field: &str,
    confidence_thresh: Option<f64>,
) -> PipelineResult<()>
where
    S: Sample,
    M: Model + ?Sized,
{
    let mut guard = ModelGuard::new(model)?;
    progress.begin(Some(samples.len()));

    for sample in samples.iter_mut() {
        let mut stream = ScopedStream::new(reader.open_video(sample.filepath())?);
        let label = guard.predict(ModelInput::Video(&mut *stream))?;
        stream.close()?;

        write_label(sample, label, label_field, confidence_thresh)?;
        progress.advance(1);
    }

    progress.finish();
    guard.finish()
}
