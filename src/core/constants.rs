//! Constants used throughout the restoration pipeline.

/// Number of landmarks produced by the landmark model (dlib 68-point scheme).
pub const LANDMARK_COUNT: usize = 68;

/// Number of canonical face parts understood by the enhancement model.
pub const FACE_PART_COUNT: usize = 18;

/// Enhancer batch size for the 512 px model variant.
pub const ENHANCER_BATCH_SIZE_512: usize = 1;

/// Enhancer batch size for the 256 px model variant.
pub const ENHANCER_BATCH_SIZE_256: usize = 4;

/// The restoration model consumes spatial dimensions snapped to this multiple.
pub const RESTORATION_SIZE_MULTIPLE: u32 = 4;

/// The scratch model consumes spatial dimensions snapped to this multiple.
pub const SCRATCH_SIZE_MULTIPLE: u32 = 16;

/// Side length the scratch model's fixed-size input modes target.
pub const SCRATCH_TARGET_SIDE: u32 = 256;

/// Square side of the face detector's network input.
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Square side of the landmark network input.
pub const LANDMARKER_INPUT_SIZE: u32 = 112;

/// Relative margin added around a detector box before landmark refinement.
pub const LANDMARK_CROP_MARGIN: f32 = 0.2;

/// Number of images above which batch image loading goes parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Fraction of the face-crop side used as the feathered blend border.
pub const BLEND_FEATHER_FRACTION: f32 = 0.0625;
