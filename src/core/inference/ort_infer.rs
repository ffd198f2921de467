//! Core ONNX Runtime inference engine with named inputs and
//! shape-validated f32 extraction.

use crate::core::batch::{Tensor2D, Tensor3D, Tensor4D};
use crate::core::config::OrtSessionConfig;
use crate::core::errors::{RestoreError, SimpleError};
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A loaded ONNX session together with its input/output naming.
///
/// The session is immutable from the caller's point of view once loaded;
/// the interior `Mutex` exists only because ONNX Runtime requires `&mut`
/// to run. The engine provides no concurrency guarantees beyond that;
/// callers sharing one engine across threads serialize on the lock.
pub struct OrtInfer {
    session: Mutex<Session>,
    input_name: String,
    output_name: Option<String>,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Loads a model, applying the optional session configuration.
    ///
    /// `input_name` defaults to `"x"`, the convention used by the exported
    /// checkpoints this crate targets. The output name is discovered from
    /// the session when not set.
    pub fn from_config(
        model_path: impl AsRef<Path>,
        config: Option<&OrtSessionConfig>,
        input_name: Option<&str>,
    ) -> Result<Self, RestoreError> {
        let path = model_path.as_ref();
        let session = super::session::build_session(path, config)?;
        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        Ok(OrtInfer {
            session: Mutex::new(session),
            input_name: input_name.unwrap_or("x").to_string(),
            output_name: None,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the configured or discovered output tensor name.
    fn get_output_name(&self) -> Result<String, RestoreError> {
        if let Some(ref name) = self.output_name {
            Ok(name.clone())
        } else {
            let session = self.session.lock().map_err(|_| {
                RestoreError::invalid_input("failed to acquire session lock")
            })?;
            if let Some(output) = session.outputs.first() {
                Ok(output.name.clone())
            } else {
                Err(RestoreError::invalid_input(
                    "no outputs available in session - model may be invalid or corrupted",
                ))
            }
        }
    }

    /// Runs the session on a single named 4D input, returning the raw
    /// output shape and data.
    pub fn infer_raw(&self, x: &Tensor4D) -> Result<(Vec<i64>, Vec<f32>), RestoreError> {
        let output_name = self.get_output_name()?;
        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            RestoreError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {:?}", x.shape()),
                e,
            )
        })?;

        let mut session = self.session.lock().map_err(|_| {
            RestoreError::inference(
                &self.model_name,
                "failed to acquire session lock",
                SimpleError::new("poisoned session lock"),
            )
        })?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| {
                RestoreError::inference(
                    &self.model_name,
                    format!(
                        "forward pass failed with input '{}' -> output '{}'",
                        self.input_name, output_name
                    ),
                    e,
                )
            })?;

        let (shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                RestoreError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{output_name}' as f32"),
                    e,
                )
            })?;
        Ok((shape.to_vec(), data.to_vec()))
    }

    /// Runs the session on two named 4D inputs (e.g. an image latent and a
    /// defect mask), returning the raw output shape and data.
    pub fn infer_raw_pair(
        &self,
        first: (&str, &Tensor4D),
        second: (&str, &Tensor4D),
    ) -> Result<(Vec<i64>, Vec<f32>), RestoreError> {
        let output_name = self.get_output_name()?;
        let (first_name, first_tensor) = first;
        let (second_name, second_tensor) = second;

        let first_ref = TensorRef::from_array_view(first_tensor.view()).map_err(|e| {
            RestoreError::inference(
                &self.model_name,
                format!("failed to convert input '{first_name}'"),
                e,
            )
        })?;
        let second_ref = TensorRef::from_array_view(second_tensor.view()).map_err(|e| {
            RestoreError::inference(
                &self.model_name,
                format!("failed to convert input '{second_name}'"),
                e,
            )
        })?;

        let mut session = self.session.lock().map_err(|_| {
            RestoreError::inference(
                &self.model_name,
                "failed to acquire session lock",
                SimpleError::new("poisoned session lock"),
            )
        })?;

        let outputs = session
            .run(ort::inputs![first_name => first_ref, second_name => second_ref])
            .map_err(|e| {
                RestoreError::inference(
                    &self.model_name,
                    format!("forward pass failed with inputs '{first_name}', '{second_name}'"),
                    e,
                )
            })?;

        let (shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                RestoreError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{output_name}' as f32"),
                    e,
                )
            })?;
        Ok((shape.to_vec(), data.to_vec()))
    }

    /// Runs inference expecting a 4D (NCHW) output.
    pub fn infer_4d(&self, x: &Tensor4D) -> Result<Tensor4D, RestoreError> {
        let (shape, data) = self.infer_raw(x)?;
        tensor_4d_from_raw(&self.model_name, &shape, data)
    }

    /// Runs inference on two named inputs expecting a 4D (NCHW) output.
    pub fn infer_4d_pair(
        &self,
        first: (&str, &Tensor4D),
        second: (&str, &Tensor4D),
    ) -> Result<Tensor4D, RestoreError> {
        let (shape, data) = self.infer_raw_pair(first, second)?;
        tensor_4d_from_raw(&self.model_name, &shape, data)
    }

    /// Runs inference expecting a 3D output (e.g. `[batch, proposals, 5]`
    /// detector boxes).
    pub fn infer_3d(&self, x: &Tensor4D) -> Result<Tensor3D, RestoreError> {
        let (shape, data) = self.infer_raw(x)?;
        if shape.len() != 3 {
            return Err(invalid_rank_error(&self.model_name, 3, &shape));
        }
        let dims = (
            shape[0] as usize,
            shape[1] as usize,
            shape[2] as usize,
        );
        Tensor3D::from_shape_vec(dims, data).map_err(RestoreError::Tensor)
    }

    /// Runs inference expecting a 2D output (e.g. `[batch, coords]`
    /// flattened landmarks).
    pub fn infer_2d(&self, x: &Tensor4D) -> Result<Tensor2D, RestoreError> {
        let (shape, data) = self.infer_raw(x)?;
        if shape.len() != 2 {
            return Err(invalid_rank_error(&self.model_name, 2, &shape));
        }
        let dims = (shape[0] as usize, shape[1] as usize);
        Tensor2D::from_shape_vec(dims, data).map_err(RestoreError::Tensor)
    }
}

fn tensor_4d_from_raw(
    model_name: &str,
    shape: &[i64],
    data: Vec<f32>,
) -> Result<Tensor4D, RestoreError> {
    if shape.len() != 4 {
        return Err(invalid_rank_error(model_name, 4, shape));
    }
    let dims = (
        shape[0] as usize,
        shape[1] as usize,
        shape[2] as usize,
        shape[3] as usize,
    );
    let expected_len = dims.0 * dims.1 * dims.2 * dims.3;
    if data.len() != expected_len {
        return Err(RestoreError::invalid_input(format!(
            "output data size mismatch for model '{model_name}': expected {expected_len}, got {}",
            data.len()
        )));
    }
    Tensor4D::from_shape_vec(dims, data).map_err(RestoreError::Tensor)
}

fn invalid_rank_error(model_name: &str, expected: usize, shape: &[i64]) -> RestoreError {
    RestoreError::invalid_input(format!(
        "model '{model_name}': expected {expected}D output tensor, got {}D with shape {shape:?}",
        shape.len()
    ))
}
