//! Restoration stage: one restored image per input image.

use crate::core::errors::RestoreError;
use crate::models::restoration::RestorationModel;
use image::{GrayImage, RgbImage};
use tracing::debug;

/// Restores each image of the batch, optionally guided by per-image
/// scratch masks, returning restored images in input order.
///
/// When masks are supplied, `masks[i]` guides `images[i]`; the two slices
/// must be the same length. The mask-absent path takes the simpler
/// transform inside the model (no binarization or dilation) but yields
/// output shaped identically to the mask-present path.
pub fn restore_photos(
    model: &RestorationModel,
    images: &[RgbImage],
    masks: Option<&[GrayImage]>,
) -> Result<Vec<RgbImage>, RestoreError> {
    if let Some(masks) = masks
        && masks.len() != images.len()
    {
        return Err(RestoreError::invalid_input(format!(
            "{} masks supplied for {} images",
            masks.len(),
            images.len()
        )));
    }

    debug!(
        count = images.len(),
        with_masks = masks.is_some(),
        "restoring photos"
    );

    match masks {
        None => images.iter().map(|image| model.restore(image, None)).collect(),
        Some(masks) => images
            .iter()
            .zip(masks)
            .map(|(image, mask)| model.restore(image, Some(mask)))
            .collect(),
    }
}
