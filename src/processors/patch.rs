//! Patch extraction geometry.
//!
//! This module computes pixel regions from normalized bounding boxes and
//! extracts the corresponding image patches. The extraction box can be
//! expanded or contracted about its center and minimally squared before
//! cropping; the final region is always clamped to the image bounds.

use crate::core::errors::{PipelineError, PipelineResult};
use crate::domain::Detection;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A pixel-space extraction rectangle `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge, in pixels.
    pub x: u32,
    /// Top edge, in pixels.
    pub y: u32,
    /// Width, in pixels.
    pub w: u32,
    /// Height, in pixels.
    pub h: u32,
}

/// A processor for extracting image patches from normalized bounding boxes.
///
/// Geometry, per detection:
/// 1. If an `alpha` is configured, both normalized box dimensions are scaled
///    by `(1 + alpha)` about the box center (`alpha = 0.1` expands by 10%,
///    `alpha = -0.1` contracts by 10%).
/// 2. The box is converted to pixel coordinates by rounding.
/// 3. If `force_square` is set, the shorter side is grown so the box is a
///    square of side `max(w, h)` pixels, centered on the original box.
/// 4. The region is clamped to the image bounds and cropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchExtractor {
    /// Whether to minimally square the box before extraction.
    force_square: bool,
    /// Expansion/contraction factor in `(-1, inf)`; None means no
    /// adjustment.
    alpha: Option<f64>,
}

impl PatchExtractor {
    /// Creates a new PatchExtractor.
    ///
    /// # Arguments
    ///
    /// * `force_square` - Whether to minimally square boxes before
    ///   extraction.
    /// * `alpha` - Optional expansion/contraction factor; must be greater
    ///   than -1.
    ///
    /// # Returns
    ///
    /// A new PatchExtractor, or invalid input if `alpha <= -1`.
    pub fn new(force_square: bool, alpha: Option<f64>) -> PipelineResult<Self> {
        if let Some(alpha) = alpha {
            if alpha <= -1.0 {
                return Err(PipelineError::invalid_input(format!(
                    "alpha must be in (-1, inf), got {alpha}"
                )));
            }
        }
        Ok(Self {
            force_square,
            alpha,
        })
    }

    /// Whether boxes are squared before extraction.
    pub fn force_square(&self) -> bool {
        self.force_square
    }

    /// The configured expansion/contraction factor.
    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    /// Computes the pixel-space extraction rectangle for a normalized box.
    ///
    /// # Arguments
    ///
    /// * `bounding_box` - The normalized `[x, y, w, h]` box.
    /// * `img_width` - The image width in pixels.
    /// * `img_height` - The image height in pixels.
    ///
    /// # Returns
    ///
    /// The clamped extraction rectangle, or invalid input if the region has
    /// zero area after clamping.
    pub fn extraction_rect(
        &self,
        bounding_box: [f64; 4],
        img_width: u32,
        img_height: u32,
    ) -> PipelineResult<PixelRect> {
        let [bx, by, bw, bh] = bounding_box;

        // Expand/contract about the box center in normalized coordinates.
        let (bx, by, bw, bh) = match self.alpha {
            Some(alpha) if alpha != 0.0 => {
                let scale = 1.0 + alpha;
                let cx = bx + bw / 2.0;
                let cy = by + bh / 2.0;
                let bw = bw * scale;
                let bh = bh * scale;
                (cx - bw / 2.0, cy - bh / 2.0, bw, bh)
            }
            _ => (bx, by, bw, bh),
        };

        let img_w = img_width as f64;
        let img_h = img_height as f64;

        let mut x1 = bx * img_w;
        let mut y1 = by * img_h;
        let mut x2 = (bx + bw) * img_w;
        let mut y2 = (by + bh) * img_h;

        // Square in pixel space so the side length holds for non-square
        // images.
        if self.force_square {
            let w = x2 - x1;
            let h = y2 - y1;
            let side = w.max(h);
            if w < side {
                let cx = (x1 + x2) / 2.0;
                x1 = cx - side / 2.0;
                x2 = cx + side / 2.0;
            }
            if h < side {
                let cy = (y1 + y2) / 2.0;
                y1 = cy - side / 2.0;
                y2 = cy + side / 2.0;
            }
        }

        let x = (x1.round() as i64).clamp(0, img_width as i64);
        let y = (y1.round() as i64).clamp(0, img_height as i64);
        let x_end = (x2.round() as i64).clamp(0, img_width as i64);
        let y_end = (y2.round() as i64).clamp(0, img_height as i64);

        let w = (x_end - x) as u32;
        let h = (y_end - y) as u32;

        if w == 0 || h == 0 {
            return Err(PipelineError::invalid_input(format!(
                "patch {bounding_box:?} has zero area after clamping to {img_width}x{img_height}"
            )));
        }

        Ok(PixelRect {
            x: x as u32,
            y: y as u32,
            w,
            h,
        })
    }

    /// Extracts the patch for a detection from an image.
    ///
    /// # Arguments
    ///
    /// * `img` - The source image.
    /// * `detection` - The detection whose bounding box defines the patch.
    ///
    /// # Returns
    ///
    /// The cropped patch, or an error if the region is degenerate.
    pub fn extract(&self, img: &RgbImage, detection: &Detection) -> PipelineResult<RgbImage> {
        let (img_width, img_height) = img.dimensions();
        let rect = self.extraction_rect(detection.bounding_box, img_width, img_height)?;
        Ok(image::imageops::crop_imm(img, rect.x, rect.y, rect.w, rect.h).to_image())
    }
}

impl Default for PatchExtractor {
    /// Creates a PatchExtractor that reproduces boxes exactly.
    fn default() -> Self {
        Self {
            force_square: false,
            alpha: None,
        }
    }
}
