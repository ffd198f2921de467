//! Global restoration model wrapper.
//!
//! The restoration network is a three-checkpoint topology: VAE-A encodes
//! the degraded image into a latent, the mapping network translates the
//! latent (conditioned on a defect mask), and VAE-B decodes the restored
//! image. All three operate in the signed `[-1, 1]` range; the wrapper
//! renormalizes the decoded output to `[0, 1]` before converting back to
//! pixels.
//!
//! The mask-absent path feeds an all-zero mask and skips binarization and
//! dilation entirely; the mask-present path resizes, binarizes, and
//! optionally dilates the supplied mask. Both paths produce output shaped
//! exactly like the input image.

use crate::core::batch::Tensor4D;
use crate::core::config::RestorationModelConfig;
use crate::core::constants::RESTORATION_SIZE_MULTIPLE;
use crate::core::errors::RestoreError;
use crate::core::inference::OrtInfer;
use crate::processors::normalization::{NormalizeImage, signed_to_display};
use crate::processors::resize::{ResizeFilter, snap_rgb_to_multiple};
use crate::utils::image::tensor_to_rgb_images;
use image::{GrayImage, RgbImage, imageops};
use tracing::debug;

const MASK_INPUT_NAME: &str = "mask";

/// A loaded restoration model (encoder, mapping, decoder).
#[derive(Debug)]
pub struct RestorationModel {
    vae_a: OrtInfer,
    mapping: OrtInfer,
    vae_b: OrtInfer,
    mask_dilation: u32,
    normalizer: NormalizeImage,
}

impl RestorationModel {
    /// Loads the three checkpoints described by the configuration.
    pub fn load(config: &RestorationModelConfig) -> Result<Self, RestoreError> {
        config.validate()?;
        let session = config.session.as_ref();
        let vae_a = OrtInfer::from_config(&config.vae_a, session, None)?;
        let mapping = OrtInfer::from_config(&config.mapping_net, session, None)?;
        let vae_b = OrtInfer::from_config(&config.vae_b, session, None)?;
        debug!(
            mapping = mapping.model_name(),
            patch_attention = config.patch_attention,
            scratch_variant = config.use_scratch_detection,
            "loaded restoration model"
        );
        Ok(Self {
            vae_a,
            mapping,
            vae_b,
            mask_dilation: config.mask_dilation,
            normalizer: NormalizeImage::signed()?,
        })
    }

    /// Restores one image, optionally guided by a scratch mask.
    pub fn restore(
        &self,
        image: &RgbImage,
        mask: Option<&GrayImage>,
    ) -> Result<RgbImage, RestoreError> {
        let prepared = snap_rgb_to_multiple(image, RESTORATION_SIZE_MULTIPLE, ResizeFilter::Bilinear);
        let (width, height) = prepared.dimensions();
        let tensor = self.normalizer.rgb_batch_to_tensor(&[&prepared])?;

        let mask_tensor = match mask {
            None => Tensor4D::zeros((1, 1, height as usize, width as usize)),
            Some(mask) => self.prepare_mask(mask, width, height),
        };

        let latent = self.vae_a.infer_4d(&tensor)?;
        let mapped = self
            .mapping
            .infer_4d_pair(("x", &latent), (MASK_INPUT_NAME, &mask_tensor))?;
        let decoded = self.vae_b.infer_4d(&mapped)?;

        let display = signed_to_display(decoded);
        let mut images = tensor_to_rgb_images(&display)?;
        let restored = images.pop().ok_or_else(|| {
            RestoreError::invalid_input("restoration model returned an empty batch")
        })?;

        // Hand back an image shaped like the caller's input regardless of
        // the snapping above.
        let (src_w, src_h) = image.dimensions();
        if restored.dimensions() == (src_w, src_h) {
            Ok(restored)
        } else {
            Ok(imageops::resize(
                &restored,
                src_w,
                src_h,
                ResizeFilter::Bilinear.filter_type(),
            ))
        }
    }

    fn prepare_mask(&self, mask: &GrayImage, width: u32, height: u32) -> Tensor4D {
        let resized = if mask.dimensions() == (width, height) {
            mask.clone()
        } else {
            imageops::resize(mask, width, height, ResizeFilter::NearestExact.filter_type())
        };
        let binary = binarize_mask(&resized);
        let dilated = if self.mask_dilation > 0 {
            dilate_mask(&binary, self.mask_dilation)
        } else {
            binary
        };

        let mut tensor = Tensor4D::zeros((1, 1, height as usize, width as usize));
        for (x, y, pixel) in dilated.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = if pixel.0[0] > 0 { 1.0 } else { 0.0 };
        }
        tensor
    }
}

/// Thresholds a mask to {0, 255}.
pub(crate) fn binarize_mask(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= 128 { 255 } else { 0 };
    }
    out
}

/// Dilates a binary mask by a square structuring element of the given
/// radius, as two separable max-filter passes.
pub(crate) fn dilate_mask(mask: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let r = radius as i64;

    // Horizontal pass.
    let mut horizontal = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut max = 0u8;
            for dx in -r..=r {
                let sx = x as i64 + dx;
                if sx >= 0 && sx < width as i64 {
                    max = max.max(mask.get_pixel(sx as u32, y).0[0]);
                }
            }
            horizontal.put_pixel(x, y, image::Luma([max]));
        }
    }

    // Vertical pass.
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut max = 0u8;
            for dy in -r..=r {
                let sy = y as i64 + dy;
                if sy >= 0 && sy < height as i64 {
                    max = max.max(horizontal.get_pixel(x, sy as u32).0[0]);
                }
            }
            out.put_pixel(x, y, image::Luma([max]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn binarize_thresholds_at_midpoint() {
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([127]));
        mask.put_pixel(1, 0, Luma([128]));
        let binary = binarize_mask(&mask);
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn dilation_grows_a_point_into_a_square() {
        let mut mask = GrayImage::new(7, 7);
        mask.put_pixel(3, 3, Luma([255]));
        let dilated = dilate_mask(&mask, 2);

        // Chebyshev distance <= 2 is filled, outside stays empty.
        assert_eq!(dilated.get_pixel(1, 1).0[0], 255);
        assert_eq!(dilated.get_pixel(5, 5).0[0], 255);
        assert_eq!(dilated.get_pixel(0, 3).0[0], 0);
        assert_eq!(dilated.get_pixel(6, 6).0[0], 0);
    }

    #[test]
    fn zero_radius_dilation_is_identity() {
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(1, 1, Luma([255]));
        let dilated = dilate_mask(&mask, 0);
        assert_eq!(dilated, mask);
    }
}
