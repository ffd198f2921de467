//! Affine warping with inverse mapping and bilinear interpolation.
//!
//! Face crops are carried out of and back into their source images by
//! affine (similarity) transforms. Warping uses inverse mapping: for each
//! destination pixel the inverse matrix locates the source position, which
//! is sampled bilinearly. Positions outside the source map to black (or
//! zero, for scalar fields), which the compositor treats as "keep the
//! original pixel".

use crate::core::errors::RestoreError;
use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use rayon::prelude::*;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2f {
    /// X coordinate of the point.
    pub x: f32,
    /// Y coordinate of the point.
    pub y: f32,
}

impl Point2f {
    /// Creates a new Point2f with the given coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Calculates the Euclidean distance between two points.
pub fn distance(p1: &Point2f, p2: &Point2f) -> f32 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

fn inverse_of(matrix: &Matrix3<f32>) -> Result<Matrix3<f32>, RestoreError> {
    matrix
        .try_inverse()
        .ok_or_else(|| RestoreError::invalid_input("cannot invert transformation matrix"))
}

fn map_inverse(inv: &Matrix3<f32>, x: u32, y: u32) -> (f32, f32) {
    let p = inv * Vector3::new(x as f32, y as f32, 1.0);
    (p.x, p.y)
}

/// Warps an RGB image by an affine matrix mapping source coordinates to
/// destination coordinates, producing a `dst_width` x `dst_height` image.
///
/// # Errors
///
/// Returns an error if the matrix is not invertible.
pub fn warp_affine_rgb(
    src_image: &RgbImage,
    matrix: &Matrix3<f32>,
    dst_width: u32,
    dst_height: u32,
) -> Result<RgbImage, RestoreError> {
    let inv_matrix = inverse_of(matrix)?;

    let mut dst_image = RgbImage::new(dst_width, dst_height);
    let (src_width, src_height) = src_image.dimensions();
    if src_width == 0 || src_height == 0 {
        return Ok(dst_image);
    }
    let buffer: &mut [u8] = dst_image.as_mut();

    // Process each row in parallel using rayon
    buffer
        .par_chunks_mut((dst_width * 3) as usize)
        .enumerate()
        .for_each(|(dst_y, row_buffer)| {
            for dst_x in 0..dst_width {
                let (src_x, src_y) = map_inverse(&inv_matrix, dst_x, dst_y as u32);

                let mut final_pixel = Rgb([0, 0, 0]);
                if src_x >= 0.0
                    && src_y >= 0.0
                    && src_x <= (src_width - 1) as f32
                    && src_y <= (src_height - 1) as f32
                {
                    final_pixel = bilinear_interpolate(src_image, src_x, src_y);
                }

                let index = (dst_x * 3) as usize;
                row_buffer[index..index + 3].copy_from_slice(&final_pixel.0);
            }
        });

    Ok(dst_image)
}

/// Warps a scalar field (e.g. a blend mask) by an affine matrix mapping
/// source coordinates to destination coordinates.
///
/// The field is indexed `[row, column]`; out-of-source positions map to
/// zero.
pub fn warp_affine_scalar(
    src: &Array2<f32>,
    matrix: &Matrix3<f32>,
    dst_width: u32,
    dst_height: u32,
) -> Result<Array2<f32>, RestoreError> {
    let inv_matrix = inverse_of(matrix)?;
    let (src_height, src_width) = src.dim();

    let mut dst = Array2::zeros((dst_height as usize, dst_width as usize));
    if src_height == 0 || src_width == 0 {
        return Ok(dst);
    }
    for ((dst_y, dst_x), value) in dst.indexed_iter_mut() {
        let (src_x, src_y) = map_inverse(&inv_matrix, dst_x as u32, dst_y as u32);
        if src_x >= 0.0
            && src_y >= 0.0
            && src_x <= (src_width - 1) as f32
            && src_y <= (src_height - 1) as f32
        {
            *value = bilinear_scalar(src, src_x, src_y);
        }
    }
    Ok(dst)
}

/// Performs bilinear interpolation to get a pixel value at non-integer
/// coordinates.
fn bilinear_interpolate(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let x1 = x.floor() as u32;
    let y1 = y.floor() as u32;
    let x2 = (x1 + 1).min(image.width() - 1);
    let y2 = (y1 + 1).min(image.height() - 1);

    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    let p11 = image.get_pixel(x1, y1);
    let p12 = image.get_pixel(x1, y2);
    let p21 = image.get_pixel(x2, y1);
    let p22 = image.get_pixel(x2, y2);

    let mut result = [0u8; 3];
    for (i, result_channel) in result.iter_mut().enumerate() {
        let val = (1.0 - dx) * (1.0 - dy) * p11.0[i] as f32
            + dx * (1.0 - dy) * p21.0[i] as f32
            + (1.0 - dx) * dy * p12.0[i] as f32
            + dx * dy * p22.0[i] as f32;
        *result_channel = val.round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}

fn bilinear_scalar(field: &Array2<f32>, x: f32, y: f32) -> f32 {
    let (height, width) = field.dim();
    let x1 = x.floor() as usize;
    let y1 = y.floor() as usize;
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);

    let dx = x - x1 as f32;
    let dy = y - y1 as f32;

    (1.0 - dx) * (1.0 - dy) * field[[y1, x1]]
        + dx * (1.0 - dy) * field[[y1, x2]]
        + (1.0 - dx) * dy * field[[y2, x1]]
        + dx * dy * field[[y2, x2]]
}
