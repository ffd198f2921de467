//! Batch tensor aliases and order-preserving batch sampling.
//!
//! Model inference consumes NCHW `f32` tensors; the aliases here are the
//! common currency between processors and the inference engine. The
//! [`BatchSampler`] splits a flat sequence into fixed-size chunks for
//! throughput without ever reordering it: chunk boundaries are a tuning
//! knob, not a semantic one.

use crate::core::errors::RestoreError;
use std::ops::Range;

/// A 2D tensor (e.g. flattened landmark coordinates per batch entry).
pub type Tensor2D = ndarray::Array2<f32>;

/// A 3D tensor (e.g. detector proposals per batch entry).
pub type Tensor3D = ndarray::Array3<f32>;

/// A 4D tensor in NCHW layout.
pub type Tensor4D = ndarray::Array4<f32>;

/// Splits a flat sequence into consecutive fixed-size chunks.
///
/// Chunks are emitted in order and each input index appears in exactly one
/// chunk, so concatenating per-chunk outputs reproduces the input order.
#[derive(Debug, Clone, Copy)]
pub struct BatchSampler {
    batch_size: usize,
}

impl BatchSampler {
    /// Creates a sampler with the given chunk size.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::ConfigError` if `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self, RestoreError> {
        if batch_size == 0 {
            return Err(RestoreError::config_error(
                "batch_size must be greater than 0",
            ));
        }
        Ok(Self { batch_size })
    }

    /// Returns the chunk size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the consecutive index ranges covering `0..len` in order.
    pub fn ranges(&self, len: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        let batch_size = self.batch_size;
        (0..len)
            .step_by(batch_size)
            .map(move |start| start..(start + batch_size).min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(BatchSampler::new(0).is_err());
    }

    #[test]
    fn ranges_cover_all_indices_in_order() {
        let sampler = BatchSampler::new(4).unwrap();
        let ranges: Vec<_> = sampler.ranges(10).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);

        let flattened: Vec<usize> = ranges.into_iter().flatten().collect();
        assert_eq!(flattened, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn ranges_on_empty_sequence() {
        let sampler = BatchSampler::new(4).unwrap();
        assert_eq!(sampler.ranges(0).count(), 0);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let sampler = BatchSampler::new(2).unwrap();
        let ranges: Vec<_> = sampler.ranges(6).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..6]);
    }
}
