//! Image-level transforms shared by the model wrappers and stages.

pub mod alignment;
pub mod blending;
pub mod normalization;
pub mod resize;

pub use alignment::alignment_matrix;
pub use blending::composite_face;
pub use normalization::{NormalizeImage, signed_to_display};
pub use resize::{ResizeFilter, ScratchInputSize};
