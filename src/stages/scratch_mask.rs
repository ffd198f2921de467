//! Scratch-mask stage: one defect mask per image.

use crate::core::errors::RestoreError;
use crate::models::scratch::ScratchModel;
use crate::processors::resize::{ResizeFilter, ScratchInputSize};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options for the scratch-mask stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScratchMaskOptions {
    /// How the image is sized for the network.
    #[serde(default)]
    pub input_size: ScratchInputSize,
    /// Filter used for the sizing and for mapping the mask back.
    #[serde(default)]
    pub resize_filter: ResizeFilter,
}

/// Detects scratches in each image of the batch, returning one mask per
/// image in input order.
///
/// A strict 1:1 per-image map with no cross-image state; a model failure
/// on any image aborts the whole invocation.
pub fn detect_scratches(
    model: &ScratchModel,
    images: &[RgbImage],
    options: &ScratchMaskOptions,
) -> Result<Vec<GrayImage>, RestoreError> {
    debug!(count = images.len(), "detecting scratches");
    images
        .iter()
        .map(|image| model.detect(image, options.input_size, options.resize_filter))
        .collect()
}
