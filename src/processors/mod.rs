//! Image processing utilities.

pub mod patch;

pub use patch::{PatchExtractor, PixelRect};
