//! Utility functions for image loading.
//!
//! This module provides helpers for loading single images and batches of
//! images from disk, converting everything to 8-bit RGB. Batched loading
//! switches to parallel decoding above a configurable threshold.

use crate::core::errors::PipelineResult;
use image::{DynamicImage, RgbImage};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to an RgbImage.
///
/// # Arguments
///
/// * `path` - The path of the image file to load.
///
/// # Returns
///
/// * `Ok(RgbImage)` - The loaded and converted RGB image.
/// * `Err(PipelineError)` - An error if the image could not be loaded.
pub fn load_image(path: &std::path::Path) -> PipelineResult<RgbImage> {
    let img = image::open(path)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads a batch of images from file paths.
///
/// Decodes sequentially up to the given threshold and in parallel via rayon
/// beyond it. Output order always matches input order.
///
/// # Arguments
///
/// * `paths` - The paths of the image files to load.
/// * `parallel_threshold` - Batch sizes above this decode in parallel.
///
/// # Returns
///
/// * `Ok(Vec<RgbImage>)` - The loaded RGB images, in input order.
/// * `Err(PipelineError)` - An error if any image could not be loaded.
pub fn load_images_batch<P: AsRef<std::path::Path> + Send + Sync>(
    paths: &[P],
    parallel_threshold: usize,
) -> PipelineResult<Vec<RgbImage>> {
    if paths.len() > parallel_threshold {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_test_png(dir: &std::path::Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = RgbImage::from_pixel(w, h, Rgb([10, 20, 30]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_image_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), "a.png", 8, 6);

        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_load_image_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_load_images_batch_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_test_png(dir.path(), "a.png", 2, 2),
            write_test_png(dir.path(), "b.png", 3, 3),
            write_test_png(dir.path(), "c.png", 4, 4),
        ];

        // Threshold of 1 forces the parallel path; order must still hold.
        let imgs = load_images_batch(&paths, 1).unwrap();
        assert_eq!(imgs.len(), 3);
        assert_eq!(imgs[0].dimensions(), (2, 2));
        assert_eq!(imgs[1].dimensions(), (3, 3));
        assert_eq!(imgs[2].dimensions(), (4, 4));
    }
}
