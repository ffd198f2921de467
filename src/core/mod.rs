//! The core module of the restoration pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Error handling
//! - Batch tensor aliases and batch sampling
//! - Model and session configuration
//! - ONNX Runtime inference engine integration
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod batch;
pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;

pub use batch::{BatchSampler, Tensor2D, Tensor3D, Tensor4D};
pub use config::{FaceSize, OrtExecutionProvider, OrtSessionConfig};
pub use constants::*;
pub use errors::{ProcessingStage, RestoreError, RestoreResult};
pub use inference::OrtInfer;

/// Initializes the tracing subscriber for logging.
///
/// Sets up the tracing subscriber with an environment filter and a
/// formatting layer. Typically called once at the start of an application.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
