//! Face-locator stage: detect, landmark, and align every face in a batch.
//!
//! Output flattening is the pipeline's one source of truth for face
//! identity: faces are concatenated in image order and, within an image,
//! in detection order, with the per-image counts recorded alongside. An
//! image with no faces contributes a zero count and nothing else; later
//! images never shift.

use crate::core::config::FaceSize;
use crate::core::errors::RestoreError;
use crate::domain::faces::DetectedFaces;
use crate::domain::group::Grouped;
use crate::models::face_detector::FaceDetectorModel;
use crate::processors::alignment::alignment_matrix;
use crate::utils::transform::warp_affine_rgb;
use image::RgbImage;
use tracing::debug;

/// Detects all faces in the batch and crops each into an aligned square
/// at the requested resolution.
///
/// Any detector or landmark failure aborts the whole invocation; there is
/// no per-image skip.
pub fn detect_faces(
    model: &FaceDetectorModel,
    images: &[RgbImage],
    face_size: FaceSize,
) -> Result<DetectedFaces, RestoreError> {
    let side = face_size.pixels();
    let mut groups = Vec::with_capacity(images.len());
    let mut flat_landmarks = Vec::new();

    for (index, image) in images.iter().enumerate() {
        let landmarks = model.detect_landmarks(image)?;
        debug!(image = index, faces = landmarks.len(), "located faces");

        let mut crops = Vec::with_capacity(landmarks.len());
        for face in &landmarks {
            let matrix = alignment_matrix(face, side)?;
            crops.push(warp_affine_rgb(image, &matrix, side, side)?);
        }
        groups.push(crops);
        flat_landmarks.extend(landmarks);
    }

    DetectedFaces::new(Grouped::from_groups(groups), flat_landmarks)
}
