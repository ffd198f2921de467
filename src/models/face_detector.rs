//! Face detector and landmark model pair.
//!
//! Detection runs on a fixed-size rendition of the image and emits corner
//! boxes with scores; surviving boxes (score threshold, then non-maximum
//! suppression) are refined by the landmark network, which predicts the
//! 68 keypoints inside an expanded face crop. All coordinates handed out
//! of this module are in source-image pixels.

use crate::core::batch::{Tensor2D, Tensor3D};
use crate::core::config::FaceDetectorConfig;
use crate::core::constants::{
    DETECTOR_INPUT_SIZE, LANDMARK_COUNT, LANDMARK_CROP_MARGIN, LANDMARKER_INPUT_SIZE,
};
use crate::core::errors::RestoreError;
use crate::core::inference::OrtInfer;
use crate::domain::landmarks::FaceLandmarks;
use crate::processors::normalization::NormalizeImage;
use crate::processors::resize::ResizeFilter;
use crate::utils::transform::Point2f;
use image::{RgbImage, imageops};
use tracing::debug;

/// One detected face region in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
    /// Detection confidence.
    pub score: f32,
}

impl FaceRegion {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

/// A loaded face detector + landmark model pair.
#[derive(Debug)]
pub struct FaceDetectorModel {
    detector: OrtInfer,
    landmarker: OrtInfer,
    score_threshold: f32,
    nms_iou: f32,
    normalizer: NormalizeImage,
}

impl FaceDetectorModel {
    /// Loads the detector and landmark checkpoints described by the
    /// configuration.
    pub fn load(config: &FaceDetectorConfig) -> Result<Self, RestoreError> {
        config.validate()?;
        let session = config.session.as_ref();
        let detector = OrtInfer::from_config(&config.detector, session, None)?;
        let landmarker = OrtInfer::from_config(&config.landmarker, session, None)?;
        debug!(
            detector = detector.model_name(),
            landmarker = landmarker.model_name(),
            "loaded face detector"
        );
        Ok(Self {
            detector,
            landmarker,
            score_threshold: config.score_threshold,
            nms_iou: config.nms_iou,
            normalizer: NormalizeImage::unsigned()?,
        })
    }

    /// Detects faces in one image, in detection order.
    pub fn detect_regions(&self, image: &RgbImage) -> Result<Vec<FaceRegion>, RestoreError> {
        let side = DETECTOR_INPUT_SIZE;
        let resized = imageops::resize(image, side, side, ResizeFilter::Bilinear.filter_type());
        let tensor = self.normalizer.rgb_batch_to_tensor(&[&resized])?;

        let proposals = self.detector.infer_3d(&tensor)?;

        let (width, height) = image.dimensions();
        let scale_x = width as f32 / side as f32;
        let scale_y = height as f32 / side as f32;
        Ok(decode_proposals(
            &proposals,
            scale_x,
            scale_y,
            self.score_threshold,
            self.nms_iou,
        ))
    }

    /// Predicts the 68 landmarks for one detected region.
    pub fn landmarks_for(
        &self,
        image: &RgbImage,
        region: &FaceRegion,
    ) -> Result<FaceLandmarks, RestoreError> {
        let (crop_x, crop_y, crop_w, crop_h) = expanded_crop(region, image.dimensions());
        let crop = imageops::crop_imm(image, crop_x, crop_y, crop_w, crop_h).to_image();
        let resized = imageops::resize(
            &crop,
            LANDMARKER_INPUT_SIZE,
            LANDMARKER_INPUT_SIZE,
            ResizeFilter::Bilinear.filter_type(),
        );
        let tensor = self.normalizer.rgb_batch_to_tensor(&[&resized])?;

        let coords = self.landmarker.infer_2d(&tensor)?;
        decode_landmarks(&coords, crop_x as f32, crop_y as f32, crop_w as f32, crop_h as f32)
    }

    /// Detects faces and their landmarks in one image, in detection
    /// order.
    pub fn detect_landmarks(&self, image: &RgbImage) -> Result<Vec<FaceLandmarks>, RestoreError> {
        let regions = self.detect_regions(image)?;
        regions
            .iter()
            .map(|region| self.landmarks_for(image, region))
            .collect()
    }
}

/// Decodes `[1, N, 5]` detector output (corner boxes + score in
/// network-input pixels) into thresholded, suppressed regions in
/// source-image pixels.
fn decode_proposals(
    proposals: &Tensor3D,
    scale_x: f32,
    scale_y: f32,
    score_threshold: f32,
    nms_iou: f32,
) -> Vec<FaceRegion> {
    let mut regions = Vec::new();
    for row in proposals.index_axis(ndarray::Axis(0), 0).outer_iter() {
        let score = row[4];
        if score < score_threshold {
            continue;
        }
        regions.push(FaceRegion {
            x1: row[0] * scale_x,
            y1: row[1] * scale_y,
            x2: row[2] * scale_x,
            y2: row[3] * scale_y,
            score,
        });
    }
    non_max_suppression(regions, nms_iou)
}

/// Non-maximum suppression keeping the highest-scoring region per
/// overlapping cluster.
fn non_max_suppression(mut regions: Vec<FaceRegion>, iou_threshold: f32) -> Vec<FaceRegion> {
    regions.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    while !regions.is_empty() {
        let best = regions.remove(0);
        regions.retain(|other| iou(&best, other) < iou_threshold);
        keep.push(best);
    }
    keep
}

/// Intersection over union of two regions.
fn iou(a: &FaceRegion, b: &FaceRegion) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;
    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Expands a region by the landmark crop margin and clamps it to the
/// image, returning integer crop bounds of at least one pixel.
fn expanded_crop(region: &FaceRegion, dimensions: (u32, u32)) -> (u32, u32, u32, u32) {
    let (width, height) = dimensions;
    let margin_x = (region.x2 - region.x1) * LANDMARK_CROP_MARGIN;
    let margin_y = (region.y2 - region.y1) * LANDMARK_CROP_MARGIN;

    let x1 = (region.x1 - margin_x).max(0.0) as u32;
    let y1 = (region.y1 - margin_y).max(0.0) as u32;
    let x2 = ((region.x2 + margin_x).ceil() as u32).min(width);
    let y2 = ((region.y2 + margin_y).ceil() as u32).min(height);

    let w = (x2.saturating_sub(x1)).max(1);
    let h = (y2.saturating_sub(y1)).max(1);
    (x1, y1, w, h)
}

/// Decodes `[1, 136]` landmark output (x/y pairs normalized to the crop)
/// into source-image coordinates.
fn decode_landmarks(
    coords: &Tensor2D,
    crop_x: f32,
    crop_y: f32,
    crop_w: f32,
    crop_h: f32,
) -> Result<FaceLandmarks, RestoreError> {
    let row = coords.index_axis(ndarray::Axis(0), 0);
    if row.len() != LANDMARK_COUNT * 2 {
        return Err(RestoreError::invalid_input(format!(
            "landmark model emitted {} coordinates, expected {}",
            row.len(),
            LANDMARK_COUNT * 2
        )));
    }

    let points = (0..LANDMARK_COUNT)
        .map(|i| {
            Point2f::new(
                crop_x + row[i * 2] * crop_w,
                crop_y + row[i * 2 + 1] * crop_h,
            )
        })
        .collect();
    FaceLandmarks::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn region(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> FaceRegion {
        FaceRegion {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = region(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = region(20.0, 20.0, 30.0, 30.0, 1.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = region(0.0, 0.0, 10.0, 10.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn nms_keeps_the_best_of_an_overlapping_cluster() {
        let regions = vec![
            region(0.0, 0.0, 10.0, 10.0, 0.6),
            region(1.0, 1.0, 11.0, 11.0, 0.9),
            region(50.0, 50.0, 60.0, 60.0, 0.7),
        ];
        let kept = non_max_suppression(regions, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);
    }

    #[test]
    fn decode_filters_by_score_and_scales_boxes() {
        let mut proposals = Array3::zeros((1, 2, 5));
        // Strong proposal at (64, 64)-(128, 128) in network pixels.
        proposals[[0, 0, 0]] = 64.0;
        proposals[[0, 0, 1]] = 64.0;
        proposals[[0, 0, 2]] = 128.0;
        proposals[[0, 0, 3]] = 128.0;
        proposals[[0, 0, 4]] = 0.95;
        // Weak proposal, dropped by the threshold.
        proposals[[0, 1, 4]] = 0.1;

        let regions = decode_proposals(&proposals, 2.0, 0.5, 0.5, 0.3);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].x1, 128.0);
        assert_eq!(regions[0].y1, 32.0);
        assert_eq!(regions[0].x2, 256.0);
        assert_eq!(regions[0].y2, 64.0);
    }

    #[test]
    fn expanded_crop_clamps_to_the_image() {
        let r = region(-5.0, 0.0, 50.0, 40.0, 1.0);
        let (x, y, w, h) = expanded_crop(&r, (60, 45));
        assert_eq!((x, y), (0, 0));
        assert!(x + w <= 60);
        assert!(y + h <= 45);
    }

    #[test]
    fn decode_landmarks_maps_into_the_crop_frame() {
        let mut coords = Tensor2D::zeros((1, LANDMARK_COUNT * 2));
        coords[[0, 0]] = 0.5;
        coords[[0, 1]] = 0.25;
        let landmarks = decode_landmarks(&coords, 10.0, 20.0, 100.0, 80.0).unwrap();
        assert_eq!(landmarks.points()[0], Point2f::new(60.0, 40.0));
        // Remaining coordinates decode to the crop origin.
        assert_eq!(landmarks.points()[1], Point2f::new(10.0, 20.0));
    }

    #[test]
    fn wrong_landmark_width_is_rejected() {
        let coords = Tensor2D::zeros((1, 10));
        assert!(decode_landmarks(&coords, 0.0, 0.0, 1.0, 1.0).is_err());
    }
}
