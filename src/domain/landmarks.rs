//! Facial landmarks in the 68-point scheme.
//!
//! Landmark indices follow the dlib convention: 0-16 jawline, 17-21 left
//! brow, 22-26 right brow, 27-35 nose, 36-41 left eye, 42-47 right eye,
//! 48-67 mouth. Coordinates are pixel positions in the source image the
//! face was detected in, not in the aligned crop.

use crate::core::constants::LANDMARK_COUNT;
use crate::core::errors::RestoreError;
use crate::utils::transform::Point2f;

const LEFT_EYE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE: std::ops::Range<usize> = 42..48;
const MOUTH: std::ops::Range<usize> = 48..68;

/// The 68 landmark positions of one detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Point2f>,
}

impl FaceLandmarks {
    /// Creates a landmark set from exactly 68 points.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` for any other point count.
    pub fn new(points: Vec<Point2f>) -> Result<Self, RestoreError> {
        if points.len() != LANDMARK_COUNT {
            return Err(RestoreError::invalid_input(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// All 68 points in dlib index order.
    pub fn points(&self) -> &[Point2f] {
        &self.points
    }

    fn centroid(&self, range: std::ops::Range<usize>) -> Point2f {
        let slice = &self.points[range];
        let n = slice.len() as f32;
        let (sx, sy) = slice
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2f::new(sx / n, sy / n)
    }

    /// Center of the left eye (mean of points 36-41).
    pub fn left_eye_center(&self) -> Point2f {
        self.centroid(LEFT_EYE)
    }

    /// Center of the right eye (mean of points 42-47).
    pub fn right_eye_center(&self) -> Point2f {
        self.centroid(RIGHT_EYE)
    }

    /// Center of the mouth (mean of points 48-67).
    pub fn mouth_center(&self) -> Point2f {
        self.centroid(MOUTH)
    }

    /// Axis-aligned bounding box of all landmarks as
    /// `(min_x, min_y, max_x, max_y)`.
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        (min_x, min_y, max_x, max_y)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a synthetic landmark set whose eye and mouth centroids land
    /// on the given points, for alignment tests.
    pub fn landmarks_with_centers(
        left_eye: Point2f,
        right_eye: Point2f,
        mouth: Point2f,
    ) -> FaceLandmarks {
        let mut points = vec![Point2f::new(0.0, 0.0); LANDMARK_COUNT];
        for p in &mut points[36..42] {
            *p = left_eye;
        }
        for p in &mut points[42..48] {
            *p = right_eye;
        }
        for p in &mut points[48..68] {
            *p = mouth;
        }
        FaceLandmarks::new(points).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_point_count_is_rejected() {
        assert!(FaceLandmarks::new(vec![Point2f::new(0.0, 0.0); 5]).is_err());
        assert!(FaceLandmarks::new(vec![Point2f::new(0.0, 0.0); 68]).is_ok());
    }

    #[test]
    fn centroids_average_their_ranges() {
        let landmarks = test_support::landmarks_with_centers(
            Point2f::new(10.0, 20.0),
            Point2f::new(30.0, 20.0),
            Point2f::new(20.0, 40.0),
        );
        assert_eq!(landmarks.left_eye_center(), Point2f::new(10.0, 20.0));
        assert_eq!(landmarks.right_eye_center(), Point2f::new(30.0, 20.0));
        assert_eq!(landmarks.mouth_center(), Point2f::new(20.0, 40.0));
    }

    #[test]
    fn bounding_box_spans_all_points() {
        let mut points = vec![Point2f::new(5.0, 5.0); 68];
        points[0] = Point2f::new(1.0, 2.0);
        points[67] = Point2f::new(9.0, 11.0);
        let landmarks = FaceLandmarks::new(points).unwrap();
        assert_eq!(landmarks.bounding_box(), (1.0, 2.0, 9.0, 11.0));
    }
}
