//! Scratch-segmentation model wrapper.
//!
//! The network consumes one grayscale image normalized to `[-1, 1]` and
//! emits a single-channel defect-probability map in `[0, 1]` at the input
//! resolution.

use crate::core::config::ScratchModelConfig;
use crate::core::errors::RestoreError;
use crate::core::inference::OrtInfer;
use crate::processors::normalization::NormalizeImage;
use crate::processors::resize::{ResizeFilter, ScratchInputSize};
use crate::utils::image::tensor_to_gray_images;
use image::{GrayImage, RgbImage, imageops};
use tracing::debug;

/// A loaded scratch-detection model.
#[derive(Debug)]
pub struct ScratchModel {
    inference: OrtInfer,
    normalizer: NormalizeImage,
}

impl ScratchModel {
    /// Loads the model described by the configuration.
    pub fn load(config: &ScratchModelConfig) -> Result<Self, RestoreError> {
        config.validate()?;
        let inference = OrtInfer::from_config(&config.checkpoint, config.session.as_ref(), None)?;
        debug!(model = inference.model_name(), "loaded scratch model");
        Ok(Self {
            inference,
            normalizer: NormalizeImage::signed()?,
        })
    }

    /// Detects scratches in one image, returning a mask at the source
    /// resolution.
    ///
    /// The image is converted to grayscale, sized per `input_size`, and
    /// the model's probability map is resized back with the same filter.
    pub fn detect(
        &self,
        image: &RgbImage,
        input_size: ScratchInputSize,
        filter: ResizeFilter,
    ) -> Result<GrayImage, RestoreError> {
        let gray = imageops::grayscale(image);
        let prepared = input_size.prepare(&gray, filter);
        let tensor = self.normalizer.gray_to_tensor(&prepared);

        let output = self.inference.infer_4d(&tensor)?;

        let mut masks = tensor_to_gray_images(&output)?;
        let mask = masks.pop().ok_or_else(|| {
            RestoreError::invalid_input("scratch model returned an empty batch")
        })?;

        let (width, height) = image.dimensions();
        if mask.dimensions() == (width, height) {
            Ok(mask)
        } else {
            Ok(imageops::resize(&mask, width, height, filter.filter_type()))
        }
    }
}
