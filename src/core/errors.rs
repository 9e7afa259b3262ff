//! Error types for the model-application pipeline.
//!
//! This module defines the error types that can occur while applying a model
//! to a sample collection, including capability and media-type mismatches,
//! media decode failures, inference failures, and configuration errors. It
//! also provides utility constructors for creating these errors with
//! appropriate context.

use crate::domain::MediaType;
use thiserror::Error;

/// Convenient result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Enum representing the errors that can occur in the pipeline.
///
/// Capability and media-type mismatches are raised before any iteration
/// begins; decode, inference, and persistence errors propagate unmodified
/// from the point of failure and leave earlier samples' side effects intact.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The model lacks a capability required by the requested operation.
    #[error("capability mismatch: {message}")]
    CapabilityMismatch {
        /// A message naming the missing capability.
        message: String,
    },

    /// The operation requires a different media type than the collection has.
    #[error("media type mismatch: operation requires {expected} media, collection is {actual}")]
    MediaTypeMismatch {
        /// The media type the operation requires.
        expected: MediaType,
        /// The media type of the collection.
        actual: MediaType,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred while decoding media through an external reader.
    #[error("media decode failed: {context}")]
    Decode {
        /// Additional context about the decode failure.
        context: String,
        /// The underlying error reported by the reader.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during model inference.
    #[error("inference")]
    Inference(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error occurred while persisting a sample field.
    #[error("field persistence: {message}")]
    Storage {
        /// A message describing the persistence failure.
        message: String,
    },

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Creates a PipelineError for a missing model capability.
    ///
    /// # Arguments
    ///
    /// * `message` - A message naming the missing capability.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn capability_mismatch(message: impl Into<String>) -> Self {
        Self::CapabilityMismatch {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for a media-type mismatch.
    ///
    /// # Arguments
    ///
    /// * `expected` - The media type the operation requires.
    /// * `actual` - The media type of the collection.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn media_type_mismatch(expected: MediaType, actual: MediaType) -> Self {
        Self::MediaTypeMismatch { expected, actual }
    }

    /// Creates a PipelineError for invalid input.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the invalid input.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for configuration errors.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the configuration error.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a PipelineError for a media decode failure.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the decode failure.
    /// * `error` - The underlying error reported by the reader.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn decode_error(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a PipelineError for inference failures.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying error that caused this error.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn inference_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Inference(Box::new(error))
    }

    /// Creates a PipelineError for a field persistence failure.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the persistence failure.
    ///
    /// # Returns
    ///
    /// A PipelineError instance.
    pub fn storage_error(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_mismatch_names_capability() {
        let err = PipelineError::capability_mismatch("model does not expose embeddings");
        assert!(err.to_string().contains("embeddings"));
    }

    #[test]
    fn test_media_type_mismatch_display() {
        let err = PipelineError::media_type_mismatch(MediaType::Image, MediaType::Video);
        let msg = err.to_string();
        assert!(msg.contains("image"));
        assert!(msg.contains("video"));
    }
}
