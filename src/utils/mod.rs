//! Utility functions for the pipeline.

pub mod image;

pub use image::{dynamic_to_rgb, load_image, load_images_batch};
