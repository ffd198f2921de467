//! Compositing enhanced faces back into their source images.
//!
//! An enhanced crop is warped back to its source position by the inverse
//! of its alignment transform and alpha-blended over the original pixels.
//! The blend weight is a feathered mask: fully opaque in the crop
//! interior, ramping to zero over a border margin, so the seam between
//! enhanced and original content stays invisible. Outside the warped crop
//! the mask is zero and the original pixel survives untouched.

use crate::core::constants::BLEND_FEATHER_FRACTION;
use crate::core::errors::{ProcessingStage, RestoreError, SimpleError};
use crate::domain::landmarks::FaceLandmarks;
use crate::processors::alignment::alignment_matrix;
use crate::utils::transform::{warp_affine_rgb, warp_affine_scalar};
use image::RgbImage;
use ndarray::Array2;

/// Builds a square blend mask of side `size`: ones in the interior,
/// linearly ramping to zero at the borders over `margin` pixels.
pub fn feather_mask(size: u32, margin: u32) -> Array2<f32> {
    let side = size as usize;
    let mut mask = Array2::ones((side, side));
    if margin == 0 {
        return mask;
    }
    let margin = margin as f32;
    for ((y, x), value) in mask.indexed_iter_mut() {
        let to_edge = (x.min(side - 1 - x).min(y).min(side - 1 - y)) as f32;
        *value = (to_edge / margin).min(1.0);
    }
    mask
}

/// Warps one enhanced face crop back onto its source image and blends it
/// in place at the position implied by its landmarks.
///
/// # Errors
///
/// Returns an error if the crop is not square or the landmarks are
/// degenerate.
pub fn composite_face(
    base: &mut RgbImage,
    face_crop: &RgbImage,
    landmarks: &FaceLandmarks,
) -> Result<(), RestoreError> {
    let (crop_w, crop_h) = face_crop.dimensions();
    if crop_w != crop_h || crop_w == 0 {
        return Err(RestoreError::invalid_input(format!(
            "face crop must be a non-empty square, got {crop_w}x{crop_h}"
        )));
    }

    // Matrix carries source coords into the crop; its inverse places the
    // crop back into the source image.
    let matrix = alignment_matrix(landmarks, crop_w)?;
    let inverse = matrix.try_inverse().ok_or_else(|| {
        RestoreError::processing(
            ProcessingStage::Blending,
            "alignment matrix is not invertible",
            SimpleError::new("singular similarity transform"),
        )
    })?;

    let (base_w, base_h) = base.dimensions();
    let warped_face = warp_affine_rgb(face_crop, &inverse, base_w, base_h)?;

    let margin = ((crop_w as f32) * BLEND_FEATHER_FRACTION).round() as u32;
    let mask = feather_mask(crop_w, margin);
    let warped_mask = warp_affine_scalar(&mask, &inverse, base_w, base_h)?;

    for (x, y, pixel) in base.enumerate_pixels_mut() {
        let weight = warped_mask[[y as usize, x as usize]];
        if weight <= 0.0 {
            continue;
        }
        let face_pixel = warped_face.get_pixel(x, y);
        for c in 0..3 {
            let blended =
                weight * face_pixel.0[c] as f32 + (1.0 - weight) * pixel.0[c] as f32;
            pixel.0[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::landmarks::test_support::landmarks_with_centers;
    use crate::processors::alignment::reference_points;
    use image::Rgb;

    #[test]
    fn feather_mask_is_opaque_inside_and_open_at_borders() {
        let mask = feather_mask(64, 4);
        assert_eq!(mask[[32, 32]], 1.0);
        assert_eq!(mask[[0, 32]], 0.0);
        assert_eq!(mask[[32, 0]], 0.0);
        // One pixel in from the border sits on the ramp.
        assert!(mask[[1, 32]] > 0.0 && mask[[1, 32]] < 1.0);
    }

    #[test]
    fn zero_margin_mask_is_fully_opaque() {
        let mask = feather_mask(8, 0);
        assert!(mask.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn non_square_crop_is_rejected() {
        let mut base = RgbImage::new(32, 32);
        let crop = RgbImage::new(16, 8);
        let [le, re, mouth] = reference_points(16);
        let landmarks = landmarks_with_centers(le, re, mouth);
        assert!(composite_face(&mut base, &crop, &landmarks).is_err());
    }

    #[test]
    fn composite_replaces_interior_and_keeps_far_pixels() {
        // Landmarks at the canonical positions of a 64-crop: the
        // alignment transform is the identity, so the crop lands on the
        // image origin-aligned.
        let mut base = RgbImage::from_pixel(128, 128, Rgb([10, 10, 10]));
        let crop = RgbImage::from_pixel(64, 64, Rgb([200, 200, 200]));
        let [le, re, mouth] = reference_points(64);
        let landmarks = landmarks_with_centers(le, re, mouth);

        composite_face(&mut base, &crop, &landmarks).unwrap();

        // Deep inside the crop footprint the enhanced pixel wins.
        assert_eq!(base.get_pixel(32, 32).0, [200, 200, 200]);
        // Far outside the footprint the original pixel survives.
        assert_eq!(base.get_pixel(120, 120).0, [10, 10, 10]);
    }
}
