//! Face alignment by similarity transform.
//!
//! A detected face is carried into its canonical square crop by the
//! similarity transform (rotation, uniform scale, translation) that maps
//! its eye and mouth centers onto fixed reference positions. The same
//! matrix, inverted, carries the enhanced crop back to the source image,
//! so alignment and compositing stay exact inverses of each other.

use crate::core::errors::RestoreError;
use crate::domain::landmarks::FaceLandmarks;
use crate::utils::transform::Point2f;
use nalgebra::{DMatrix, DVector, Matrix3};

/// Reference landmark positions as fractions of the crop side: left eye,
/// right eye, mouth center.
const REFERENCE_FRACTIONS: [(f32, f32); 3] = [(0.355, 0.46), (0.645, 0.46), (0.5, 0.73)];

/// The canonical positions of the three alignment anchors inside a square
/// crop of the given side length.
pub fn reference_points(face_size: u32) -> [Point2f; 3] {
    let side = face_size as f32;
    REFERENCE_FRACTIONS.map(|(fx, fy)| Point2f::new(fx * side, fy * side))
}

/// Least-squares similarity transform mapping `src` points onto `dst`
/// points, returned as a homogeneous 3x3 matrix.
///
/// # Errors
///
/// Returns `RestoreError::InvalidInput` if fewer than two pairs are given
/// or the points are degenerate (coincident), leaving the transform
/// underdetermined.
pub fn similarity_from_pairs(
    src: &[Point2f],
    dst: &[Point2f],
) -> Result<Matrix3<f32>, RestoreError> {
    if src.len() != dst.len() || src.len() < 2 {
        return Err(RestoreError::invalid_input(
            "similarity transform needs at least 2 matched point pairs",
        ));
    }

    // Coincident source points leave rotation and scale underdetermined;
    // the normal equations below would be numerically singular.
    let spread = src
        .iter()
        .flat_map(|a| src.iter().map(move |b| crate::utils::transform::distance(a, b)))
        .fold(0.0f32, f32::max);
    if spread < 1e-3 {
        return Err(RestoreError::invalid_input(
            "degenerate landmarks: anchor points are coincident",
        ));
    }

    // Parameters (a, b, tx, ty) of [a -b tx; b a ty]; each pair
    // contributes one row for x and one for y. The solve runs in f64:
    // normal equations square the pixel coordinates and f32 loses too
    // much there.
    let rows = src.len() * 2;
    let mut a = DMatrix::<f64>::zeros(rows, 4);
    let mut b = DVector::<f64>::zeros(rows);
    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        a.set_row(
            i * 2,
            &nalgebra::RowDVector::from_row_slice(&[s.x as f64, -s.y as f64, 1.0, 0.0]),
        );
        b[i * 2] = d.x as f64;
        a.set_row(
            i * 2 + 1,
            &nalgebra::RowDVector::from_row_slice(&[s.y as f64, s.x as f64, 0.0, 1.0]),
        );
        b[i * 2 + 1] = d.y as f64;
    }

    // Normal equations; the 4x4 system is singular exactly when the
    // source points are coincident.
    let normal = a.transpose() * &a;
    let rhs = a.transpose() * &b;
    let solution = normal.lu().solve(&rhs).ok_or_else(|| {
        RestoreError::invalid_input("degenerate landmarks: cannot solve similarity transform")
    })?;

    Ok(Matrix3::new(
        solution[0] as f32,
        -solution[1] as f32,
        solution[2] as f32,
        solution[1] as f32,
        solution[0] as f32,
        solution[3] as f32,
        0.0,
        0.0,
        1.0,
    ))
}

/// The similarity transform carrying a face from source-image coordinates
/// into its canonical `face_size` x `face_size` crop.
pub fn alignment_matrix(
    landmarks: &FaceLandmarks,
    face_size: u32,
) -> Result<Matrix3<f32>, RestoreError> {
    let anchors = [
        landmarks.left_eye_center(),
        landmarks.right_eye_center(),
        landmarks.mouth_center(),
    ];
    similarity_from_pairs(&anchors, &reference_points(face_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::landmarks::test_support::landmarks_with_centers;
    use nalgebra::Vector3;

    fn apply(matrix: &Matrix3<f32>, p: Point2f) -> Point2f {
        let v = matrix * Vector3::new(p.x, p.y, 1.0);
        Point2f::new(v.x, v.y)
    }

    #[test]
    fn anchors_at_reference_positions_give_identity() {
        let [le, re, mouth] = reference_points(512);
        let landmarks = landmarks_with_centers(le, re, mouth);
        let matrix = alignment_matrix(&landmarks, 512).unwrap();
        for p in reference_points(512) {
            let mapped = apply(&matrix, p);
            assert!((mapped.x - p.x).abs() < 1e-2, "{mapped:?} vs {p:?}");
            assert!((mapped.y - p.y).abs() < 1e-2);
        }
    }

    #[test]
    fn scaled_anchors_map_onto_reference_exactly() {
        // Anchors laid out as a half-size face in the corner of a larger
        // image must land on the canonical positions.
        let [le, re, mouth] = reference_points(256);
        let shift = |p: Point2f| Point2f::new(p.x + 40.0, p.y + 60.0);
        let landmarks = landmarks_with_centers(shift(le), shift(re), shift(mouth));
        let matrix = alignment_matrix(&landmarks, 512).unwrap();

        for (src, dst) in [shift(le), shift(re), shift(mouth)]
            .into_iter()
            .zip(reference_points(512))
        {
            let mapped = apply(&matrix, src);
            assert!((mapped.x - dst.x).abs() < 1e-2);
            assert!((mapped.y - dst.y).abs() < 1e-2);
        }
    }

    #[test]
    fn rotated_face_round_trips_through_inverse() {
        // A face rotated in the source image: aligning then inverting must
        // reproduce the source anchor positions (the compositor relies on
        // this exact inverse).
        let angle = 0.3f32;
        let (sin, cos) = angle.sin_cos();
        let rotate = |p: Point2f| {
            Point2f::new(
                cos * p.x - sin * p.y + 100.0,
                sin * p.x + cos * p.y + 50.0,
            )
        };
        let [le, re, mouth] = reference_points(512);
        let src = [rotate(le), rotate(re), rotate(mouth)];
        let landmarks = landmarks_with_centers(src[0], src[1], src[2]);

        let matrix = alignment_matrix(&landmarks, 512).unwrap();
        let inverse = matrix.try_inverse().unwrap();
        for (s, d) in src.iter().zip(reference_points(512)) {
            let back = apply(&inverse, d);
            assert!((back.x - s.x).abs() < 1e-1);
            assert!((back.y - s.y).abs() < 1e-1);
        }
    }

    #[test]
    fn coincident_anchors_are_rejected() {
        let p = Point2f::new(10.0, 10.0);
        let landmarks = landmarks_with_centers(p, p, p);
        assert!(alignment_matrix(&landmarks, 512).is_err());
    }
}
