//! Media decoding seams.
//!
//! Media decoding is an external collaborator of the pipeline: the executors
//! only require something that can decode an image path into an RGB buffer
//! and open a video path as a frame-sequential stream. This module defines
//! those seams and provides a filesystem-backed default for images.

use crate::core::errors::{PipelineError, PipelineResult};
use crate::utils::load_image;
use image::RgbImage;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::warn;

/// A frame-sequential video reader.
///
/// Video models receive one open stream per `predict`/`embed` call and
/// consume it in a single pass; the pipeline never frame-batches video.
pub trait VideoStream {
    /// Decodes the next frame, or returns None at end of stream.
    fn next_frame(&mut self) -> PipelineResult<Option<RgbImage>>;

    /// Releases the underlying decoder resources.
    ///
    /// Called exactly once per stream by the pipeline's scoped acquisition,
    /// on both success and failure paths.
    fn close(&mut self) -> PipelineResult<()> {
        Ok(())
    }
}

/// Scoped acquisition of a video stream.
///
/// Guarantees that [`VideoStream::close`] runs after one full pass, whether
/// the pass completed or returned early with an error. A close failure on
/// the drop path is logged rather than raised.
pub struct ScopedStream {
    stream: Option<Box<dyn VideoStream>>,
}

impl ScopedStream {
    /// Wraps an open stream in a close-on-drop scope.
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Closes the stream explicitly, surfacing any close error.
    pub fn close(mut self) -> PipelineResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.close()?;
        }
        Ok(())
    }
}

impl Deref for ScopedStream {
    type Target = dyn VideoStream;

    fn deref(&self) -> &Self::Target {
        self.stream
            .as_deref()
            .expect("stream accessed after close")
    }
}

impl DerefMut for ScopedStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream
            .as_deref_mut()
            .expect("stream accessed after close")
    }
}

impl Drop for ScopedStream {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = stream.close() {
                warn!("failed to close video stream: {err}");
            }
        }
    }
}

/// Trait for decoding sample media from paths.
pub trait MediaReader {
    /// Decodes the image at the given path into an RGB buffer.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the image file.
    ///
    /// # Returns
    ///
    /// The decoded RGB image, or a decode error.
    fn decode_image(&self, path: &Path) -> PipelineResult<RgbImage>;

    /// Decodes a batch of images, in input order.
    ///
    /// The default decodes sequentially through
    /// [`MediaReader::decode_image`]; implementations may decode in
    /// parallel above `parallel_threshold` as long as order is preserved.
    ///
    /// # Arguments
    ///
    /// * `paths` - The paths of the image files.
    /// * `parallel_threshold` - Batch sizes above this may decode in
    ///   parallel.
    ///
    /// # Returns
    ///
    /// The decoded RGB images, in input order.
    fn decode_images(
        &self,
        paths: &[&Path],
        parallel_threshold: usize,
    ) -> PipelineResult<Vec<RgbImage>> {
        let _ = parallel_threshold;
        paths.iter().map(|p| self.decode_image(p)).collect()
    }

    /// Opens the video at the given path as a frame-sequential stream.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the video file.
    ///
    /// # Returns
    ///
    /// An open stream, released by the caller via [`ScopedStream`].
    fn open_video(&self, path: &Path) -> PipelineResult<Box<dyn VideoStream>>;
}

/// Filesystem-backed media reader.
///
/// Images are decoded through the `image` crate. Video decoding requires an
/// external decoder; plug one in through a custom [`MediaReader`].
#[derive(Debug, Default)]
pub struct FsMediaReader;

impl FsMediaReader {
    /// Creates a new FsMediaReader.
    pub fn new() -> Self {
        Self
    }
}

impl MediaReader for FsMediaReader {
    fn decode_image(&self, path: &Path) -> PipelineResult<RgbImage> {
        load_image(path)
    }

    fn decode_images(
        &self,
        paths: &[&Path],
        parallel_threshold: usize,
    ) -> PipelineResult<Vec<RgbImage>> {
        crate::utils::load_images_batch(paths, parallel_threshold)
    }

    fn open_video(&self, _path: &Path) -> PipelineResult<Box<dyn VideoStream>> {
        Err(PipelineError::config_error(
            "no video decoder configured; provide a MediaReader with video support",
        ))
    }
}
