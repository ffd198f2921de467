//! Run-length-encoded grouping of a flat payload.
//!
//! A batch of N images yields a variable number of faces per image. Faces
//! travel between stages as one flat sequence, concatenated in image
//! order and, within an image, in detection order; the per-image counts
//! are the only record of where the image boundaries fall. [`Grouped`]
//! binds the two together so the sum invariant
//! `sum(counts) == items.len()` is checked once, at construction, instead
//! of being a convention every caller must uphold.
//!
//! Partitioning back into per-image groups walks the counts with a
//! running offset, the exact inverse of the flatten step. Both
//! directions live here and nowhere else.

use crate::core::errors::RestoreError;
use image::RgbImage;
use std::ops::Range;

/// A flat payload together with its per-group counts.
///
/// Invariant (enforced at every construction): the counts sum to the
/// payload length. Groups may be empty; an empty group occupies a
/// position in `counts` but contributes nothing to the payload, so later
/// groups never shift.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    counts: Vec<usize>,
    items: Vec<T>,
}

/// The face payload exchanged between locator, enhancer, and compositor.
pub type FaceBatch = Grouped<RgbImage>;

impl<T> Grouped<T> {
    /// Creates a grouping from counts and a flat payload.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` if the counts do not sum to
    /// the payload length.
    pub fn new(counts: Vec<usize>, items: Vec<T>) -> Result<Self, RestoreError> {
        let total: usize = counts.iter().sum();
        if total != items.len() {
            return Err(RestoreError::invalid_input(format!(
                "group counts sum to {total} but payload holds {} items",
                items.len()
            )));
        }
        Ok(Self { counts, items })
    }

    /// Creates a grouping by flattening per-group lists, preserving group
    /// order and within-group order.
    pub fn from_groups(groups: Vec<Vec<T>>) -> Self {
        let counts: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        let items: Vec<T> = groups.into_iter().flatten().collect();
        Self { counts, items }
    }

    /// Creates an empty grouping of `num_groups` empty groups.
    pub fn empty(num_groups: usize) -> Self {
        Self {
            counts: vec![0; num_groups],
            items: Vec::new(),
        }
    }

    /// The per-group counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// The flat payload, in group order then within-group order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total number of items across all groups.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the payload is empty (counts may still hold zeros).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of groups (the source batch size).
    pub fn num_groups(&self) -> usize {
        self.counts.len()
    }

    /// The consecutive payload range of each group, in group order.
    ///
    /// This is the running-offset partition: range `i` starts where range
    /// `i - 1` ended and spans exactly `counts[i]` entries. Together the
    /// ranges cover the payload with no gaps and no overlap.
    pub fn group_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.counts.iter().scan(0usize, |offset, &count| {
            let start = *offset;
            *offset += count;
            Some(start..*offset)
        })
    }

    /// Borrowing iterator over per-group slices.
    pub fn groups(&self) -> impl Iterator<Item = &[T]> {
        self.group_ranges().map(|range| &self.items[range])
    }

    /// Consumes the grouping, reproducing the per-group lists.
    pub fn into_groups(mut self) -> Vec<Vec<T>> {
        let mut groups = Vec::with_capacity(self.counts.len());
        // Draining from the front keeps within-group order; counts are
        // walked in group order.
        for count in self.counts.iter().copied() {
            groups.push(self.items.drain(..count).collect());
        }
        groups
    }

    /// Maps the payload item-by-item, keeping counts and order.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Grouped<U> {
        Grouped {
            counts: self.counts,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    /// Fallible variant of [`map`]; the first error aborts the whole
    /// mapping.
    ///
    /// [`map`]: Grouped::map
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Grouped<U>, E> {
        let items = self
            .items
            .into_iter()
            .map(f)
            .collect::<Result<Vec<U>, E>>()?;
        Ok(Grouped {
            counts: self.counts,
            items,
        })
    }

    /// Rebuilds a grouping with the same counts over a new payload.
    ///
    /// # Errors
    ///
    /// Returns `RestoreError::InvalidInput` if the new payload length
    /// differs from the current one.
    pub fn with_items<U>(&self, items: Vec<U>) -> Result<Grouped<U>, RestoreError> {
        Grouped::new(self.counts.to_vec(), items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_mismatch_is_rejected() {
        let result = Grouped::new(vec![2, 1], vec!["a", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn flatten_then_partition_is_identity() {
        // Property: for any per-group lists, flattening and partitioning
        // by the running-offset scheme reproduces the original grouping.
        let groups = vec![
            vec![10, 11],
            vec![],
            vec![20],
            vec![30, 31, 32],
            vec![],
        ];
        let grouped = Grouped::from_groups(groups.clone());
        assert_eq!(grouped.counts(), &[2, 0, 1, 3, 0]);
        assert_eq!(grouped.len(), 6);
        assert_eq!(grouped.into_groups(), groups);
    }

    #[test]
    fn group_ranges_walk_a_running_offset() {
        let grouped = Grouped::new(vec![2, 0, 3], vec![1, 2, 3, 4, 5]).unwrap();
        let ranges: Vec<_> = grouped.group_ranges().collect();
        assert_eq!(ranges, vec![0..2, 2..2, 2..5]);

        let slices: Vec<&[i32]> = grouped.groups().collect();
        assert_eq!(slices[0], &[1, 2]);
        assert!(slices[1].is_empty());
        assert_eq!(slices[2], &[3, 4, 5]);
    }

    #[test]
    fn empty_groups_do_not_shift_later_groups() {
        let grouped = Grouped::new(vec![0, 0, 2], vec!["x", "y"]).unwrap();
        let groups = grouped.into_groups();
        assert_eq!(groups[0], Vec::<&str>::new());
        assert_eq!(groups[1], Vec::<&str>::new());
        assert_eq!(groups[2], vec!["x", "y"]);
    }

    #[test]
    fn map_preserves_counts_and_order() {
        let grouped = Grouped::new(vec![1, 2], vec![1, 2, 3]).unwrap();
        let mapped = grouped.map(|v| v * 10);
        assert_eq!(mapped.counts(), &[1, 2]);
        assert_eq!(mapped.items(), &[10, 20, 30]);
    }

    #[test]
    fn try_map_propagates_the_first_error() {
        let grouped = Grouped::new(vec![2], vec![1, 2]).unwrap();
        let result: Result<Grouped<i32>, &str> =
            grouped.try_map(|v| if v == 2 { Err("boom") } else { Ok(v) });
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[test]
    fn with_items_revalidates_the_sum_invariant() {
        let grouped = Grouped::new(vec![1, 1], vec!["a", "b"]).unwrap();
        assert!(grouped.with_items(vec![1, 2]).is_ok());
        assert!(grouped.with_items(vec![1]).is_err());
    }

    #[test]
    fn empty_batch_of_empty_groups() {
        let grouped: Grouped<u8> = Grouped::empty(3);
        assert_eq!(grouped.num_groups(), 3);
        assert!(grouped.is_empty());
        assert_eq!(grouped.groups().count(), 3);
    }
}
