//! Media type classification for samples.

use serde::{Deserialize, Serialize};

/// The media type of a sample collection, governing which executor applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image media, decoded eagerly into an RGB buffer.
    Image,
    /// Frame-sequential video media, streamed through a scoped reader.
    Video,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}
