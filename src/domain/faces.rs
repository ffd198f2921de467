//! The face locator's combined output.

use crate::core::errors::RestoreError;
use crate::domain::group::FaceBatch;
use crate::domain::landmarks::FaceLandmarks;

/// Aligned face crops with their per-image grouping and landmarks.
///
/// `landmarks[k]` belongs to `faces.items()[k]` for every `k`; the two
/// sequences share one order, established at detection time. The
/// enhancement stage does not carry landmarks through, so callers hold on
/// to this structure (or its landmark half) until compositing.
#[derive(Debug, Clone)]
pub struct DetectedFaces {
    /// Aligned square face crops, grouped by source image.
    pub faces: FaceBatch,
    /// Landmarks parallel to the flat face payload, in source-image
    /// coordinates.
    pub landmarks: Vec<FaceLandmarks>,
}

impl DetectedFaces {
    /// Binds a face batch to its landmark sequence.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` if the landmark count differs
    /// from the face count.
    pub fn new(faces: FaceBatch, landmarks: Vec<FaceLandmarks>) -> Result<Self, RestoreError> {
        if faces.len() != landmarks.len() {
            return Err(RestoreError::invalid_input(format!(
                "face payload holds {} entries but {} landmark sets were supplied",
                faces.len(),
                landmarks.len()
            )));
        }
        Ok(Self { faces, landmarks })
    }

    /// Total number of detected faces across the batch.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether no face was detected anywhere in the batch.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::Grouped;
    use crate::domain::landmarks::test_support::landmarks_with_centers;
    use crate::utils::transform::Point2f;
    use image::RgbImage;

    #[test]
    fn landmark_count_must_match_face_count() {
        let faces = Grouped::new(vec![1], vec![RgbImage::new(4, 4)]).unwrap();
        let landmarks = vec![
            landmarks_with_centers(
                Point2f::new(1.0, 1.0),
                Point2f::new(3.0, 1.0),
                Point2f::new(2.0, 3.0),
            );
            2
        ];
        assert!(DetectedFaces::new(faces.clone(), landmarks).is_err());
        assert!(DetectedFaces::new(faces, Vec::new()).is_err());
    }
}
