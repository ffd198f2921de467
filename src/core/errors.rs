//! Error types for the restoration pipeline.
//!
//! This module defines the error type shared by every stage of the
//! pipeline, including image loading errors, processing errors, inference
//! errors, and configuration errors, together with utility constructors
//! for attaching context.

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type RestoreResult<T> = Result<T, RestoreError>;

/// Enum representing different stages of processing in the pipeline.
///
/// Used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during tensor operations.
    TensorOperation,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during face alignment.
    Alignment,
    /// Error occurred during batch processing.
    BatchProcessing,
    /// Error occurred while compositing faces back into an image.
    Blending,
    /// Error occurred during post-processing.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Alignment => write!(f, "alignment"),
            ProcessingStage::BatchProcessing => write!(f, "batch processing"),
            ProcessingStage::Blending => write!(f, "blending"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the restoration pipeline.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred during model inference.
    #[error("inference with model '{model_name}': {context}")]
    Inference {
        /// Name of the model that failed.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading a model checkpoint.
    #[error("failed to load model from '{path}': {context}")]
    ModelLoad {
        /// Path of the checkpoint that failed to load.
        path: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error indicating invalid input. Used for every precondition
    /// violation, including grouping-invariant breaches.
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

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl RestoreError {
    /// Creates a processing error for a given stage with context.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RestoreError::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an error for tensor operations.
    pub fn tensor_operation(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing(ProcessingStage::TensorOperation, context, source)
    }

    /// Creates an inference error carrying the model name and context.
    pub fn inference(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RestoreError::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a model-load error for a checkpoint path.
    pub fn model_load(
        path: &std::path::Path,
        context: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        RestoreError::ModelLoad {
            path: path.display().to_string(),
            context: context.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates an invalid-input error from a message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RestoreError::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error from a message.
    pub fn config_error(message: impl Into<String>) -> Self {
        RestoreError::ConfigError {
            message: message.into(),
        }
    }
}

/// A minimal string-backed error for wrapping plain messages as sources.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_stage_display() {
        assert_eq!(ProcessingStage::Alignment.to_string(), "alignment");
        assert_eq!(ProcessingStage::Generic.to_string(), "processing");
    }

    #[test]
    fn invalid_input_message_is_preserved() {
        let err = RestoreError::invalid_input("counts do not sum to payload length");
        assert!(err.to_string().contains("counts do not sum"));
    }

    #[test]
    fn inference_error_names_the_model() {
        let err = RestoreError::inference(
            "face_enhancer",
            "forward pass",
            SimpleError::new("boom"),
        );
        assert!(err.to_string().contains("face_enhancer"));
    }
}
