//! The externally invocable pipeline operations.
//!
//! Each operation has a fixed input/output contract and composes with the
//! others by wiring declared outputs into declared inputs: image batches,
//! face batches (counts + flat payload), and landmark sequences. The
//! [`pipeline`] module offers the common detect-enhance-blend composition
//! as one call.

pub mod blend_faces;
pub mod detect_faces;
pub mod enhance_faces;
pub mod pipeline;
pub mod restore;
pub mod scratch_mask;

pub use blend_faces::blend_faces;
pub use detect_faces::detect_faces;
pub use enhance_faces::enhance_faces;
pub use pipeline::{ConfigFormat, PipelineConfig, RestorePipeline};
pub use restore::restore_photos;
pub use scratch_mask::{ScratchMaskOptions, detect_scratches};
