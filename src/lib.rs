//! # retrophoto
//!
//! Old-photo restoration pipeline built on ONNX Runtime.
//!
//! This crate exposes the stages of a photo-restoration workflow as
//! independently invocable operations over batches of images:
//! - Scratch detection (image -> defect mask)
//! - Global restoration (image, optional mask -> restored image)
//! - Face detection and alignment (images -> cropped faces + landmarks)
//! - Face enhancement (cropped faces -> enhanced faces)
//! - Face compositing (enhanced faces blended back into their sources)
//!
//! The numerically heavy work is delegated to pretrained ONNX models;
//! this crate owns the conversion between image and tensor
//! representations, the per-image/per-face batch bookkeeping, and the
//! geometry that carries faces out of and back into their source images.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, model configuration, and ONNX inference
//! * [`domain`] - The face grouping protocol, landmarks, and part masks
//! * [`models`] - Wrappers around the pretrained model checkpoints
//! * [`stages`] - The pipeline operations and their composition
//! * [`processors`] - Image-level transforms (normalization, resize, alignment, blending)
//! * [`utils`] - Image loading and the image/tensor bridge

pub mod core;
pub mod domain;
pub mod models;
pub mod processors;
pub mod stages;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{ProcessingStage, RestoreError, RestoreResult};

    // Model configuration
    pub use crate::core::config::{
        FaceDetectorConfig, FaceEnhancerConfig, FaceSize, RestorationModelConfig,
        ScratchModelConfig,
    };

    // Grouping protocol and face domain types
    pub use crate::domain::{DetectedFaces, FaceBatch, FaceLandmarks, FacePart, PartOverrides};

    // Model handles
    pub use crate::models::{FaceDetectorModel, FaceEnhancerModel, RestorationModel, ScratchModel};

    // Stage operations
    pub use crate::stages::{
        PipelineConfig, RestorePipeline, blend_faces, detect_faces, detect_scratches,
        enhance_faces, restore_photos,
    };

    // Image utilities
    pub use crate::utils::{load_image, load_images_batch};
}
