//! Domain types for the pipeline.
//!
//! This module contains the media classification and label entities the
//! pipeline reads from and writes to samples.

pub mod labels;
pub mod media;

pub use labels::{Classification, Detection, Detections, Label, Polyline, Polylines};
pub use media::MediaType;
