//! The composed detect-enhance-blend pipeline.
//!
//! Convenience for the common case of "find, enhance, and blend back all
//! faces in a batch" with no intermediate access to per-stage outputs.
//! Faces are detected at the enhancer's crop resolution so no resizing
//! happens between stages.

use crate::core::config::{FaceDetectorConfig, FaceEnhancerConfig};
use crate::core::errors::RestoreError;
use crate::models::face_detector::FaceDetectorModel;
use crate::models::face_enhancer::FaceEnhancerModel;
use crate::stages::{blend_faces, detect_faces, enhance_faces};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration for the composed pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Face detector + landmark model configuration.
    pub face_detector: FaceDetectorConfig,
    /// Face enhancer configuration.
    pub face_enhancer: FaceEnhancerConfig,
}

impl PipelineConfig {
    /// Validates both model configurations.
    pub fn validate(&self) -> Result<(), RestoreError> {
        self.face_detector.validate()?;
        self.face_enhancer.validate()?;
        Ok(())
    }

    /// Loads a pipeline configuration from a file, auto-detecting the
    /// format from the extension.
    pub fn load_from_file(path: &Path) -> Result<Self, RestoreError> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            RestoreError::config_error(format!(
                "unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            RestoreError::config_error(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::load_from_string(&content, format)
    }

    /// Loads a pipeline configuration from a string with the given
    /// format.
    pub fn load_from_string(content: &str, format: ConfigFormat) -> Result<Self, RestoreError> {
        let config: Self = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                RestoreError::config_error(format!("failed to parse TOML config: {e}"))
            })?,
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
                RestoreError::config_error(format!("failed to parse JSON config: {e}"))
            })?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration file format.
#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// The loaded detect-enhance-blend pipeline.
#[derive(Debug)]
pub struct RestorePipeline {
    detector: FaceDetectorModel,
    enhancer: FaceEnhancerModel,
}

impl RestorePipeline {
    /// Assembles a pipeline from already-loaded models.
    pub fn new(detector: FaceDetectorModel, enhancer: FaceEnhancerModel) -> Self {
        Self { detector, enhancer }
    }

    /// Loads both models from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, RestoreError> {
        config.validate()?;
        Ok(Self {
            detector: FaceDetectorModel::load(&config.face_detector)?,
            enhancer: FaceEnhancerModel::load(&config.face_enhancer)?,
        })
    }

    /// Runs detect, enhance, and blend over the batch, returning exactly
    /// one output image per input image, in order.
    pub fn run(&self, images: &[RgbImage]) -> Result<Vec<RgbImage>, RestoreError> {
        let detected = detect_faces(&self.detector, images, self.enhancer.face_size())?;
        debug!(
            images = images.len(),
            faces = detected.len(),
            "pipeline detection complete"
        );
        let enhanced = enhance_faces(&self.enhancer, &detected.faces, None)?;
        blend_faces(images, &enhanced, &detected.landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FaceSize;

    #[test]
    fn toml_config_round_trips() {
        let content = r#"
            [face_detector]
            detector = "models/detector.onnx"
            landmarker = "models/landmarks.onnx"

            [face_enhancer]
            checkpoint = "models/enhancer.onnx"
            face_size = "512"
        "#;
        let config = PipelineConfig::load_from_string(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.face_enhancer.face_size, FaceSize::Px512);
        assert_eq!(config.face_detector.score_threshold, 0.5);
    }

    #[test]
    fn json_config_parses_and_validates() {
        let content = r#"{
            "face_detector": {
                "detector": "det.onnx",
                "landmarker": "lmk.onnx",
                "score_threshold": 0.6,
                "nms_iou": 0.4
            },
            "face_enhancer": {
                "checkpoint": "enh.onnx",
                "face_size": "256"
            }
        }"#;
        let config = PipelineConfig::load_from_string(content, ConfigFormat::Json).unwrap();
        assert_eq!(config.face_enhancer.face_size, FaceSize::Px256);
        assert_eq!(config.face_detector.score_threshold, 0.6);
    }

    #[test]
    fn invalid_config_content_is_rejected() {
        // Empty checkpoint path fails validation even though it parses.
        let content = r#"{
            "face_detector": {"detector": "", "landmarker": "lmk.onnx"},
            "face_enhancer": {"checkpoint": "enh.onnx", "face_size": "512"}
        }"#;
        assert!(PipelineConfig::load_from_string(content, ConfigFormat::Json).is_err());
    }

    #[test]
    fn format_detection_by_extension() {
        assert!(matches!(
            ConfigFormat::from_extension(Path::new("a.toml")),
            Some(ConfigFormat::Toml)
        ));
        assert!(matches!(
            ConfigFormat::from_extension(Path::new("a.json")),
            Some(ConfigFormat::Json)
        ));
        assert!(ConfigFormat::from_extension(Path::new("a.yaml")).is_none());
    }
}
