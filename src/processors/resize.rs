//! Resizing policies for model inputs.
//!
//! The scratch model accepts three input sizings carried over from the
//! original tool: the full image (snapped to the network's size
//! multiple), a fixed 256 x 256 squash, or an aspect-preserving scale
//! with the short side at 256. The restoration model only needs the
//! snapping.

use crate::core::constants::{SCRATCH_SIZE_MULTIPLE, SCRATCH_TARGET_SIDE};
use image::imageops::FilterType;
use image::{GrayImage, RgbImage, imageops};
use serde::{Deserialize, Serialize};

/// Resampling filters selectable at the stage surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    /// Nearest-neighbor sampling.
    NearestExact,
    /// Bilinear (triangle) filtering.
    Bilinear,
    /// Area-averaging; approximated by a Gaussian kernel.
    Area,
    /// Bicubic (Catmull-Rom) filtering.
    Bicubic,
    /// Lanczos windowed sinc filtering.
    Lanczos,
}

impl Default for ResizeFilter {
    fn default() -> Self {
        Self::Bilinear
    }
}

impl ResizeFilter {
    /// The `image` crate filter backing this selection.
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::NearestExact => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Area => FilterType::Gaussian,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Snaps dimensions down to the nearest multiple of `multiple`, never
/// below one multiple.
pub fn snapped_dims(width: u32, height: u32, multiple: u32) -> (u32, u32) {
    let snap = |v: u32| ((v / multiple) * multiple).max(multiple);
    (snap(width), snap(height))
}

/// Resizes an RGB image so both sides are multiples of `multiple`.
pub fn snap_rgb_to_multiple(img: &RgbImage, multiple: u32, filter: ResizeFilter) -> RgbImage {
    let (w, h) = snapped_dims(img.width(), img.height(), multiple);
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    imageops::resize(img, w, h, filter.filter_type())
}

/// Input sizing modes for the scratch model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchInputSize {
    /// Keep the source size, snapped to the network's size multiple.
    FullSize,
    /// Squash to a fixed 256 x 256.
    Resize256,
    /// Scale the short side to 256 preserving aspect ratio, then snap.
    Scale256,
}

impl Default for ScratchInputSize {
    fn default() -> Self {
        Self::FullSize
    }
}

impl ScratchInputSize {
    /// Produces the network-input rendition of a grayscale image under
    /// this sizing mode.
    pub fn prepare(self, img: &GrayImage, filter: ResizeFilter) -> GrayImage {
        let (width, height) = img.dimensions();
        let (target_w, target_h) = match self {
            ScratchInputSize::FullSize => {
                snapped_dims(width, height, SCRATCH_SIZE_MULTIPLE)
            }
            ScratchInputSize::Resize256 => (SCRATCH_TARGET_SIDE, SCRATCH_TARGET_SIDE),
            ScratchInputSize::Scale256 => {
                let short = width.min(height).max(1);
                let scale = SCRATCH_TARGET_SIDE as f32 / short as f32;
                let w = (width as f32 * scale).round() as u32;
                let h = (height as f32 * scale).round() as u32;
                snapped_dims(w, h, SCRATCH_SIZE_MULTIPLE)
            }
        };
        if (target_w, target_h) == (width, height) {
            return img.clone();
        }
        imageops::resize(img, target_w, target_h, filter.filter_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_floors_to_multiple_with_lower_bound() {
        assert_eq!(snapped_dims(100, 50, 16), (96, 48));
        assert_eq!(snapped_dims(16, 16, 16), (16, 16));
        assert_eq!(snapped_dims(10, 300, 16), (16, 288));
    }

    #[test]
    fn full_size_mode_snaps_to_sixteen() {
        let img = GrayImage::new(100, 70);
        let prepared = ScratchInputSize::FullSize.prepare(&img, ResizeFilter::Bilinear);
        assert_eq!(prepared.dimensions(), (96, 64));
    }

    #[test]
    fn resize_mode_squashes_to_fixed_square() {
        let img = GrayImage::new(1000, 400);
        let prepared = ScratchInputSize::Resize256.prepare(&img, ResizeFilter::Bilinear);
        assert_eq!(prepared.dimensions(), (256, 256));
    }

    #[test]
    fn scale_mode_targets_short_side() {
        let img = GrayImage::new(512, 1024);
        let prepared = ScratchInputSize::Scale256.prepare(&img, ResizeFilter::Bilinear);
        // Short side scaled to 256, long side to 512, both already
        // multiples of 16.
        assert_eq!(prepared.dimensions(), (256, 512));
    }

    #[test]
    fn filter_names_round_trip_through_serde() {
        let json = serde_json::to_string(&ResizeFilter::NearestExact).unwrap();
        assert_eq!(json, "\"nearest-exact\"");
        let parsed: ResizeFilter = serde_json::from_str("\"lanczos\"").unwrap();
        assert_eq!(parsed, ResizeFilter::Lanczos);
    }
}
