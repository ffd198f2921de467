//! Configuration records for sessions and model loading.
//!
//! Every model load is driven by an immutable configuration record with
//! named fields, validated at construction time via [`validate`] methods,
//! never at the point of use. Session-level options (threads, optimization
//! level, execution providers) are grouped in [`OrtSessionConfig`].
//!
//! [`validate`]: ScratchModelConfig::validate

use crate::core::constants::{ENHANCER_BATCH_SIZE_256, ENHANCER_BATCH_SIZE_512};
use crate::core::errors::RestoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

impl Default for OrtGraphOptimizationLevel {
    fn default() -> Self {
        Self::Level1
    }
}

/// Execution providers for ONNX Runtime.
///
/// Stands in for raw device-identifier lists: each provider names a device
/// class, CUDA additionally carries the device ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available).
    CPU,
    /// NVIDIA CUDA execution provider.
    CUDA {
        /// CUDA device ordinal (default: 0).
        device_id: Option<i32>,
    },
}

impl Default for OrtExecutionProvider {
    fn default() -> Self {
        Self::CPU
    }
}

/// Configuration for ONNX Runtime sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    /// Graph optimization level.
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference.
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
}

/// The two face-crop resolutions supported by the enhancement models.
///
/// Any other resolution is unrepresentable; parsing a pixel count outside
/// the supported set fails at configuration time, before any batch size
/// would be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceSize {
    /// 256 x 256 face crops (the lower-resolution model variant).
    #[serde(rename = "256")]
    Px256,
    /// 512 x 512 face crops (the high-resolution model variant).
    #[serde(rename = "512")]
    Px512,
}

impl FaceSize {
    /// Parses a pixel side length into a supported face size.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::ConfigError` for any value other than 256 or
    /// 512.
    pub fn from_pixels(pixels: u32) -> Result<Self, RestoreError> {
        match pixels {
            256 => Ok(Self::Px256),
            512 => Ok(Self::Px512),
            other => Err(RestoreError::config_error(format!(
                "unsupported face size {other}: expected 256 or 512"
            ))),
        }
    }

    /// The square side length in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            Self::Px256 => 256,
            Self::Px512 => 512,
        }
    }

    /// The inference batch size tuned for this model variant.
    ///
    /// A throughput knob only: batching never reorders faces.
    pub fn enhancer_batch_size(self) -> usize {
        match self {
            Self::Px256 => ENHANCER_BATCH_SIZE_256,
            Self::Px512 => ENHANCER_BATCH_SIZE_512,
        }
    }
}

impl std::fmt::Display for FaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pixels())
    }
}

fn check_checkpoint_path(path: &Path, field: &str) -> Result<(), RestoreError> {
    if path.as_os_str().is_empty() {
        return Err(RestoreError::config_error(format!(
            "{field} checkpoint path must not be empty"
        )));
    }
    Ok(())
}

/// Configuration for loading the scratch-segmentation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchModelConfig {
    /// Path to the scratch-detection checkpoint.
    pub checkpoint: PathBuf,
    /// Session configuration, if any.
    #[serde(default)]
    pub session: Option<OrtSessionConfig>,
}

impl ScratchModelConfig {
    /// Creates a config for the given checkpoint with default session
    /// settings.
    pub fn new(checkpoint: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            session: None,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RestoreError> {
        check_checkpoint_path(&self.checkpoint, "scratch model")
    }
}

/// Configuration for loading the global restoration model.
///
/// The restoration network is a three-checkpoint topology: an encoder
/// (VAE-A), a latent mapping network, and a decoder (VAE-B).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorationModelConfig {
    /// Path to the latent mapping-network checkpoint.
    pub mapping_net: PathBuf,
    /// Path to the encoder (VAE-A) checkpoint.
    pub vae_a: PathBuf,
    /// Path to the decoder (VAE-B) checkpoint.
    pub vae_b: PathBuf,
    /// Whether the checkpoints are the scratch-aware variant. Recorded so
    /// callers can pick matching checkpoints; the mask input itself decides
    /// per call.
    #[serde(default)]
    pub use_scratch_detection: bool,
    /// Whether the mapping net is the patch-attention (HR) variant.
    #[serde(default)]
    pub patch_attention: bool,
    /// Radius, in pixels, by which a supplied scratch mask is dilated
    /// before inference. Zero disables dilation.
    #[serde(default)]
    pub mask_dilation: u32,
    /// Session configuration, if any.
    #[serde(default)]
    pub session: Option<OrtSessionConfig>,
}

impl RestorationModelConfig {
    /// Creates a config from the three checkpoint paths with default
    /// settings.
    pub fn new(
        mapping_net: impl Into<PathBuf>,
        vae_a: impl Into<PathBuf>,
        vae_b: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mapping_net: mapping_net.into(),
            vae_a: vae_a.into(),
            vae_b: vae_b.into(),
            use_scratch_detection: false,
            patch_attention: false,
            mask_dilation: 0,
            session: None,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RestoreError> {
        check_checkpoint_path(&self.mapping_net, "mapping net")?;
        check_checkpoint_path(&self.vae_a, "VAE-A")?;
        check_checkpoint_path(&self.vae_b, "VAE-B")?;
        Ok(())
    }
}

/// Configuration for loading the face detector + landmark model pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetectorConfig {
    /// Path to the face-detection checkpoint.
    pub detector: PathBuf,
    /// Path to the 68-point landmark checkpoint.
    pub landmarker: PathBuf,
    /// Minimum detection score for a proposal to count as a face.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    #[serde(default = "default_nms_iou")]
    pub nms_iou: f32,
    /// Session configuration, if any.
    #[serde(default)]
    pub session: Option<OrtSessionConfig>,
}

fn default_score_threshold() -> f32 {
    0.5
}

fn default_nms_iou() -> f32 {
    0.3
}

impl FaceDetectorConfig {
    /// Creates a config from the detector and landmarker checkpoint paths
    /// with default thresholds.
    pub fn new(detector: impl Into<PathBuf>, landmarker: impl Into<PathBuf>) -> Self {
        Self {
            detector: detector.into(),
            landmarker: landmarker.into(),
            score_threshold: default_score_threshold(),
            nms_iou: default_nms_iou(),
            session: None,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RestoreError> {
        check_checkpoint_path(&self.detector, "face detector")?;
        check_checkpoint_path(&self.landmarker, "landmark model")?;
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(RestoreError::config_error(format!(
                "score_threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.nms_iou) {
            return Err(RestoreError::config_error(format!(
                "nms_iou must be within [0, 1], got {}",
                self.nms_iou
            )));
        }
        Ok(())
    }
}

/// Configuration for loading the face-enhancement model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceEnhancerConfig {
    /// Path to the enhancement checkpoint.
    pub checkpoint: PathBuf,
    /// The face-crop resolution this checkpoint was trained for.
    pub face_size: FaceSize,
    /// Session configuration, if any.
    #[serde(default)]
    pub session: Option<OrtSessionConfig>,
}

impl FaceEnhancerConfig {
    /// Creates a config for the given checkpoint and face size.
    pub fn new(checkpoint: impl Into<PathBuf>, face_size: FaceSize) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            face_size,
            session: None,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RestoreError> {
        check_checkpoint_path(&self.checkpoint, "face enhancer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_size_parsing() {
        assert_eq!(FaceSize::from_pixels(256).unwrap(), FaceSize::Px256);
        assert_eq!(FaceSize::from_pixels(512).unwrap(), FaceSize::Px512);
        assert!(FaceSize::from_pixels(384).is_err());
    }

    #[test]
    fn face_size_batch_sizes() {
        assert_eq!(FaceSize::Px512.enhancer_batch_size(), 1);
        assert_eq!(FaceSize::Px256.enhancer_batch_size(), 4);
    }

    #[test]
    fn empty_checkpoint_path_fails_validation() {
        let config = ScratchModelConfig::new("");
        assert!(config.validate().is_err());

        let config = ScratchModelConfig::new("models/scratch.onnx");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn restoration_config_checks_all_three_paths() {
        let mut config = RestorationModelConfig::new("map.onnx", "vae_a.onnx", "vae_b.onnx");
        assert!(config.validate().is_ok());
        config.vae_b = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn detector_thresholds_are_range_checked() {
        let mut config = FaceDetectorConfig::new("det.onnx", "lmk.onnx");
        assert!(config.validate().is_ok());
        config.score_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn face_size_serde_uses_pixel_names() {
        let json = serde_json::to_string(&FaceSize::Px512).unwrap();
        assert_eq!(json, "\"512\"");
        let parsed: FaceSize = serde_json::from_str("\"256\"").unwrap();
        assert_eq!(parsed, FaceSize::Px256);
    }
}
