//! Face-enhancement stage: an order-preserving map over the flat face
//! payload.
//!
//! Faces run through the model in fixed-size chunks selected by the model
//! variant (a throughput knob only); concatenating chunk outputs restores
//! the input order exactly, and the per-image counts pass through
//! untouched. Callers pairing the output with the locator's landmark
//! sequence rely on that: enhancing face `k` must never produce output at
//! any other index.

use crate::core::batch::BatchSampler;
use crate::core::errors::RestoreError;
use crate::domain::group::FaceBatch;
use crate::domain::parts::PartOverrides;
use crate::models::face_enhancer::FaceEnhancerModel;
use tracing::debug;

/// Enhances every face in the batch, preserving count, order, and
/// grouping.
///
/// # Preconditions (fatal)
///
/// * Every face is already at the model's crop resolution.
/// * Each present part override carries exactly one mask per face.
///
/// An empty payload (including counts that are all zero) is not an error:
/// the output is an equally empty batch with the same counts.
pub fn enhance_faces(
    model: &FaceEnhancerModel,
    faces: &FaceBatch,
    overrides: Option<&PartOverrides>,
) -> Result<FaceBatch, RestoreError> {
    let side = model.face_size().pixels();
    check_face_dimensions(faces, side)?;
    if let Some(overrides) = overrides {
        overrides.check_face_count(faces.len())?;
    }

    let sampler = BatchSampler::new(model.face_size().enhancer_batch_size())?;
    debug!(
        faces = faces.len(),
        batch_size = sampler.batch_size(),
        "enhancing faces"
    );

    let mut enhanced = Vec::with_capacity(faces.len());
    for range in sampler.ranges(faces.len()) {
        let chunk: Vec<&image::RgbImage> = faces.items()[range.clone()].iter().collect();
        let outputs = model.enhance_chunk(&chunk, overrides, range.start)?;
        enhanced.extend(outputs);
    }

    // Same counts over the new payload; the constructor re-checks the sum
    // invariant.
    faces.with_items(enhanced)
}

/// Validates that every face in the payload is a square of side `side`.
pub(crate) fn check_face_dimensions(faces: &FaceBatch, side: u32) -> Result<(), RestoreError> {
    for (index, face) in faces.items().iter().enumerate() {
        if face.dimensions() != (side, side) {
            return Err(RestoreError::invalid_input(format!(
                "face {index} is {}x{}, expected {side}x{side}",
                face.width(),
                face.height()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::Grouped;
    use image::RgbImage;

    #[test]
    fn dimension_check_names_the_offending_face() {
        let faces = Grouped::new(
            vec![1, 1],
            vec![RgbImage::new(8, 8), RgbImage::new(8, 4)],
        )
        .unwrap();
        let err = check_face_dimensions(&faces, 8).unwrap_err();
        assert!(err.to_string().contains("face 1"));
    }

    #[test]
    fn dimension_check_accepts_a_uniform_batch() {
        let faces = Grouped::new(vec![2, 0], vec![RgbImage::new(8, 8); 2]).unwrap();
        assert!(check_face_dimensions(&faces, 8).is_ok());
    }

    #[test]
    fn empty_batch_passes_the_dimension_check() {
        let faces: FaceBatch = Grouped::empty(4);
        assert!(check_face_dimensions(&faces, 8).is_ok());
    }
}
