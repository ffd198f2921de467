//! Wrappers around the pretrained model checkpoints.
//!
//! Each wrapper owns its ONNX session(s) and the pre/post-processing that
//! belongs to the model's input contract. Handles are immutable once
//! loaded and reusable across invocations; nothing here keeps state
//! between calls.

pub mod face_detector;
pub mod face_enhancer;
pub mod restoration;
pub mod scratch;

pub use face_detector::{FaceDetectorModel, FaceRegion};
pub use face_enhancer::FaceEnhancerModel;
pub use restoration::RestorationModel;
pub use scratch::ScratchModel;
