//! Domain types for the face pipeline.
//!
//! The central structure here is [`Grouped`], the run-length-encoded
//! grouping that carries every detected face across stage boundaries
//! while remembering which source image it belongs to. Everything else
//! (landmarks, part masks, the locator's combined output) hangs off that
//! protocol.

pub mod faces;
pub mod group;
pub mod landmarks;
pub mod parts;

pub use faces::DetectedFaces;
pub use group::{FaceBatch, Grouped};
pub use landmarks::FaceLandmarks;
pub use parts::{FacePart, PartOverrides};
