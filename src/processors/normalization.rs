//! Image normalization into model input tensors.
//!
//! Normalization is parameterized by per-channel scaling factors
//! `alpha = scale / std` and offsets `beta = -mean / std`, applied as
//! `value * alpha + beta`. The pipeline's models consume the signed range
//! `[-1, 1]` and emit it back; [`signed_to_display`] maps outputs to the
//! `[0, 1]` display range.

use crate::core::batch::Tensor4D;
use crate::core::errors::RestoreError;
use image::{GrayImage, RgbImage};

/// Normalizes images into NCHW input tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std).
    pub alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std).
    pub beta: Vec<f32>,
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0)
    /// * `mean` - Optional mean values for each channel (defaults to [0.5, 0.5, 0.5])
    /// * `std` - Optional standard deviation values for each channel (defaults to [0.5, 0.5, 0.5])
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Scale is less than or equal to 0
    /// * Mean or std vectors don't have exactly 3 elements
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(
        scale: Option<f32>,
        mean: Option<Vec<f32>>,
        std: Option<Vec<f32>>,
    ) -> Result<Self, RestoreError> {
        let scale = scale.unwrap_or(1.0 / 255.0);
        let mean = mean.unwrap_or_else(|| vec![0.5, 0.5, 0.5]);
        let std = std.unwrap_or_else(|| vec![0.5, 0.5, 0.5]);

        if scale <= 0.0 {
            return Err(RestoreError::config_error("scale must be greater than 0"));
        }
        if mean.len() != 3 {
            return Err(RestoreError::config_error(
                "mean must have exactly 3 elements for RGB",
            ));
        }
        if std.len() != 3 {
            return Err(RestoreError::config_error(
                "std must have exactly 3 elements for RGB",
            ));
        }
        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 {
                return Err(RestoreError::config_error(format!(
                    "standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha: Vec<f32> = std.iter().map(|s| scale / s).collect();
        let beta: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| -m / s).collect();
        Ok(Self { alpha, beta })
    }

    /// Normalization into the signed `[-1, 1]` range the restoration and
    /// enhancement models consume.
    pub fn signed() -> Result<Self, RestoreError> {
        Self::new(None, None, None)
    }

    /// Normalization into the unsigned `[0, 1]` range.
    pub fn unsigned() -> Result<Self, RestoreError> {
        Self::new(
            None,
            Some(vec![0.0, 0.0, 0.0]),
            Some(vec![1.0, 1.0, 1.0]),
        )
    }

    /// Normalizes a batch of same-size RGB images into an `[N, 3, H, W]`
    /// tensor, preserving batch order.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` if the batch is empty or the
    /// images do not share dimensions.
    pub fn rgb_batch_to_tensor(&self, images: &[&RgbImage]) -> Result<Tensor4D, RestoreError> {
        let Some(first) = images.first() else {
            return Err(RestoreError::invalid_input(
                "cannot build a tensor from an empty image batch",
            ));
        };
        let (width, height) = first.dimensions();
        for (i, img) in images.iter().enumerate() {
            if img.dimensions() != (width, height) {
                return Err(RestoreError::invalid_input(format!(
                    "image {i} has dimensions {:?}, expected {:?}",
                    img.dimensions(),
                    (width, height)
                )));
            }
        }

        let (h, w) = (height as usize, width as usize);
        let mut tensor = Tensor4D::zeros((images.len(), 3, h, w));
        for (n, img) in images.iter().enumerate() {
            for (x, y, pixel) in img.enumerate_pixels() {
                for c in 0..3 {
                    tensor[[n, c, y as usize, x as usize]] =
                        pixel.0[c] as f32 * self.alpha[c] + self.beta[c];
                }
            }
        }
        Ok(tensor)
    }

    /// Normalizes a single grayscale image into a `[1, 1, H, W]` tensor
    /// using the first channel's parameters.
    pub fn gray_to_tensor(&self, image: &GrayImage) -> Tensor4D {
        let (width, height) = image.dimensions();
        let (h, w) = (height as usize, width as usize);
        let mut tensor = Tensor4D::zeros((1, 1, h, w));
        for (x, y, pixel) in image.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] =
                pixel.0[0] as f32 * self.alpha[0] + self.beta[0];
        }
        tensor
    }
}

/// Maps a model output tensor from the signed `[-1, 1]` range to the
/// `[0, 1]` display range, clamping stray values.
pub fn signed_to_display(mut tensor: Tensor4D) -> Tensor4D {
    tensor.mapv_inplace(|v| ((v + 1.0) / 2.0).clamp(0.0, 1.0));
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(NormalizeImage::new(Some(0.0), None, None).is_err());
        assert!(NormalizeImage::new(None, Some(vec![0.5; 2]), None).is_err());
        assert!(NormalizeImage::new(None, None, Some(vec![0.5, 0.5, 0.0])).is_err());
    }

    #[test]
    fn signed_normalization_maps_extremes() {
        let norm = NormalizeImage::signed().unwrap();
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        let tensor = norm.rgb_batch_to_tensor(&[&img]).unwrap();
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn batch_order_is_preserved_in_tensor_layout() {
        let norm = NormalizeImage::unsigned().unwrap();
        let black = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let white = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let tensor = norm.rgb_batch_to_tensor(&[&black, &white]).unwrap();
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert!((tensor[[1, 0, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let norm = NormalizeImage::signed().unwrap();
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(norm.rgb_batch_to_tensor(&[&a, &b]).is_err());
    }

    #[test]
    fn gray_normalization_uses_first_channel() {
        let norm = NormalizeImage::signed().unwrap();
        let mut img = GrayImage::new(1, 1);
        img.put_pixel(0, 0, Luma([255]));
        let tensor = norm.gray_to_tensor(&img);
        assert_eq!(tensor.shape(), &[1, 1, 1, 1]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn signed_to_display_clamps() {
        let mut tensor = Tensor4D::zeros((1, 1, 1, 3));
        tensor[[0, 0, 0, 0]] = -1.0;
        tensor[[0, 0, 0, 1]] = 1.0;
        tensor[[0, 0, 0, 2]] = 3.0;
        let display = signed_to_display(tensor);
        assert_eq!(display[[0, 0, 0, 0]], 0.0);
        assert_eq!(display[[0, 0, 0, 1]], 1.0);
        assert_eq!(display[[0, 0, 0, 2]], 1.0);
    }
}
