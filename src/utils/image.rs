//! Image loading and the image/tensor bridge.
//!
//! Stage boundaries carry per-image pixel buffers (`RgbImage`,
//! `GrayImage`); model boundaries carry batched NCHW `f32` tensors. The
//! functions here convert model outputs back into pixel buffers; the
//! forward direction (pixels to normalized tensors) lives in
//! [`crate::processors::normalization`].

use crate::core::batch::Tensor4D;
use crate::core::constants::DEFAULT_PARALLEL_THRESHOLD;
use crate::core::errors::RestoreError;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts a DynamicImage to a GrayImage.
pub fn dynamic_to_gray(img: DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `RestoreError::ImageLoad` if the image cannot be loaded from
/// the specified path.
pub fn load_image(path: &std::path::Path) -> Result<RgbImage, RestoreError> {
    let img = image::open(path).map_err(RestoreError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads a batch of images from file paths, in order.
///
/// Uses parallel loading above a small threshold; the returned vector is
/// ordered by the input paths regardless.
pub fn load_images_batch<P: AsRef<std::path::Path> + Send + Sync>(
    paths: &[P],
) -> Result<Vec<RgbImage>, RestoreError> {
    if paths.len() > DEFAULT_PARALLEL_THRESHOLD {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}

/// Creates an RgbImage from raw pixel data.
///
/// Returns `None` if the data length doesn't match the dimensions.
pub fn create_rgb_image(width: u32, height: u32, data: Vec<u8>) -> Option<RgbImage> {
    if data.len() != (width * height * 3) as usize {
        return None;
    }
    ImageBuffer::from_raw(width, height, data)
}

fn check_batch_layout(
    tensor: &Tensor4D,
    expected_channels: usize,
) -> Result<(usize, usize, usize), RestoreError> {
    let shape = tensor.shape();
    let (n, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
    if c != expected_channels {
        return Err(RestoreError::invalid_input(format!(
            "expected {expected_channels}-channel tensor, got {c} channels (shape {shape:?})"
        )));
    }
    if h == 0 || w == 0 {
        return Err(RestoreError::invalid_input(format!(
            "tensor has empty spatial dimensions (shape {shape:?})"
        )));
    }
    Ok((n, h, w))
}

fn to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Converts a `[N, 3, H, W]` tensor with values in `[0, 1]` into per-image
/// RGB buffers, preserving batch order.
///
/// Values outside `[0, 1]` are clamped.
pub fn tensor_to_rgb_images(tensor: &Tensor4D) -> Result<Vec<RgbImage>, RestoreError> {
    let (n, h, w) = check_batch_layout(tensor, 3)?;
    let mut images = Vec::with_capacity(n);
    for i in 0..n {
        let mut img = RgbImage::new(w as u32, h as u32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let (yy, xx) = (y as usize, x as usize);
            *pixel = Rgb([
                to_u8(tensor[[i, 0, yy, xx]]),
                to_u8(tensor[[i, 1, yy, xx]]),
                to_u8(tensor[[i, 2, yy, xx]]),
            ]);
        }
        images.push(img);
    }
    Ok(images)
}

/// Converts a `[N, 1, H, W]` tensor with values in `[0, 1]` into per-image
/// grayscale buffers, preserving batch order.
pub fn tensor_to_gray_images(tensor: &Tensor4D) -> Result<Vec<GrayImage>, RestoreError> {
    let (n, h, w) = check_batch_layout(tensor, 1)?;
    let mut images = Vec::with_capacity(n);
    for i in 0..n {
        let mut img = GrayImage::new(w as u32, h as u32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Luma([to_u8(tensor[[i, 0, y as usize, x as usize]])]);
        }
        images.push(img);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn create_rgb_image_checks_length() {
        assert!(create_rgb_image(2, 2, vec![0; 12]).is_some());
        assert!(create_rgb_image(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn tensor_to_rgb_round_trips_values() {
        let mut tensor = Array4::zeros((1, 3, 2, 2));
        tensor[[0, 0, 0, 0]] = 1.0;
        tensor[[0, 1, 0, 1]] = 0.5;
        tensor[[0, 2, 1, 1]] = 2.0; // clamps to 255

        let images = tensor_to_rgb_images(&tensor).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(images[0].get_pixel(1, 0).0[1], 128);
        assert_eq!(images[0].get_pixel(1, 1).0[2], 255);
    }

    #[test]
    fn tensor_to_rgb_rejects_wrong_channel_count() {
        let tensor = Array4::zeros((1, 1, 2, 2));
        assert!(tensor_to_rgb_images(&tensor).is_err());
    }

    #[test]
    fn tensor_to_gray_preserves_batch_order() {
        let mut tensor = Array4::zeros((2, 1, 1, 1));
        tensor[[0, 0, 0, 0]] = 0.0;
        tensor[[1, 0, 0, 0]] = 1.0;
        let masks = tensor_to_gray_images(&tensor).unwrap();
        assert_eq!(masks[0].get_pixel(0, 0).0[0], 0);
        assert_eq!(masks[1].get_pixel(0, 0).0[0], 255);
    }
}
