//! Face-compositing stage: re-partition the flat face payload and blend
//! each face back into its source image.
//!
//! This is the inverse of the locator's flatten step. The per-image
//! counts drive a running-offset partition of both the enhanced faces and
//! the landmark sequence; each image consumes exactly its count of
//! consecutive entries, the offsets never read past the end, and no entry
//! is left unconsumed. All of this is enforced by construction of the face batch
//! plus the precondition checks here.

use crate::core::errors::RestoreError;
use crate::domain::group::FaceBatch;
use crate::domain::landmarks::FaceLandmarks;
use crate::processors::blending::composite_face;
use image::RgbImage;
use tracing::debug;

/// Warps each enhanced face back to its source position and blends it
/// into the original image, returning the batch in input order.
///
/// # Preconditions (fatal)
///
/// * `faces` holds one group per input image.
/// * `landmarks` is parallel to the flat face payload, in the order
///   established at detection time.
///
/// An image whose count is zero is returned pixel-identical.
pub fn blend_faces(
    images: &[RgbImage],
    faces: &FaceBatch,
    landmarks: &[FaceLandmarks],
) -> Result<Vec<RgbImage>, RestoreError> {
    if faces.num_groups() != images.len() {
        return Err(RestoreError::invalid_input(format!(
            "face counts cover {} images but {} images were supplied",
            faces.num_groups(),
            images.len()
        )));
    }
    if landmarks.len() != faces.len() {
        return Err(RestoreError::invalid_input(format!(
            "{} landmark sets supplied for {} faces",
            landmarks.len(),
            faces.len()
        )));
    }

    debug!(
        images = images.len(),
        faces = faces.len(),
        "blending faces"
    );

    let mut blended = Vec::with_capacity(images.len());
    for (image, range) in images.iter().zip(faces.group_ranges()) {
        if range.is_empty() {
            blended.push(image.clone());
            continue;
        }
        let mut canvas = image.clone();
        for (face, face_landmarks) in faces.items()[range.clone()]
            .iter()
            .zip(&landmarks[range])
        {
            composite_face(&mut canvas, face, face_landmarks)?;
        }
        blended.push(canvas);
    }
    Ok(blended)
}
