//! Helpers for constructing ONNX Runtime sessions from configuration.

use crate::core::config::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::errors::RestoreError;
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;

impl From<OrtGraphOptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OrtGraphOptimizationLevel) -> Self {
        match level {
            OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
            OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        }
    }
}

/// Builds a session for the given checkpoint, applying the optional
/// session configuration (threads, optimization level, execution
/// providers).
pub fn build_session(
    model_path: impl AsRef<Path>,
    config: Option<&OrtSessionConfig>,
) -> Result<Session, RestoreError> {
    let path = model_path.as_ref();
    let mut builder = Session::builder()?.with_log_level(LogLevel::Error)?;

    if let Some(config) = config {
        if let Some(threads) = config.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        if let Some(threads) = config.inter_threads {
            builder = builder.with_inter_threads(threads)?;
        }
        if let Some(level) = config.optimization_level {
            builder = builder.with_optimization_level(level.into())?;
        }
        if let Some(providers) = &config.execution_providers {
            builder = apply_execution_providers(builder, providers)?;
        }
    }

    builder.commit_from_file(path).map_err(|e| {
        RestoreError::model_load(
            path,
            "failed to create ONNX session; verify model path and compatibility with the selected execution providers",
            Some(e),
        )
    })
}

fn apply_execution_providers(
    builder: SessionBuilder,
    providers: &[OrtExecutionProvider],
) -> Result<SessionBuilder, RestoreError> {
    let mut dispatch: Vec<ExecutionProviderDispatch> = Vec::with_capacity(providers.len());
    for provider in providers {
        match provider {
            OrtExecutionProvider::CPU => {
                dispatch.push(CPUExecutionProvider::default().build());
            }
            OrtExecutionProvider::CUDA { device_id } => {
                #[cfg(feature = "cuda")]
                {
                    let mut ep = ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        ep = ep.with_device_id(*id);
                    }
                    dispatch.push(ep.build());
                }
                #[cfg(not(feature = "cuda"))]
                {
                    let _ = device_id;
                    tracing::warn!(
                        "CUDA execution provider requested but the 'cuda' feature is disabled; falling back to CPU"
                    );
                    dispatch.push(CPUExecutionProvider::default().build());
                }
            }
        }
    }
    Ok(builder.with_execution_providers(dispatch)?)
}
