//! Configurations: immutable candidate subsets of an input.
//!
//! A configuration is a sorted, duplicate-free list of indices into a shared
//! [`Input`]. Every derivation (`complement`, `slice`, `without_ranges`, ...)
//! returns a new configuration; the original stays valid, so reducers can keep
//! earlier candidates around for comparison and rollback.
//!
//! Positions passed to the derivation methods are positions *within this
//! configuration* (0..len), not indices of the original input.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use crate::input::Input;

/// A candidate version of the input under reduction.
pub struct Configuration<T> {
    input: Arc<Input<T>>,
    indices: Arc<[usize]>,
}

impl<T> Clone for Configuration<T> {
    fn clone(&self) -> Self {
        Self {
            input: Arc::clone(&self.input),
            indices: Arc::clone(&self.indices),
        }
    }
}

impl<T> Configuration<T> {
    /// A configuration holding every element of `input`.
    pub fn full(input: Arc<Input<T>>) -> Self {
        let indices: Arc<[usize]> = (0..input.len()).collect();
        Self { input, indices }
    }

    /// A configuration holding no element of `input`.
    pub fn empty(input: Arc<Input<T>>) -> Self {
        Self {
            input,
            indices: Arc::from(Vec::new()),
        }
    }

    /// A configuration holding the given original indices.
    ///
    /// # Panics
    ///
    /// Panics if the indices are not strictly increasing or point past the
    /// end of the input.
    pub fn from_indices(input: Arc<Input<T>>, indices: Vec<usize>) -> Self {
        assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "configuration indices must be sorted and unique"
        );
        if let Some(&last) = indices.last() {
            assert!(
                last < input.len(),
                "configuration index {} out of bounds for input of length {}",
                last,
                input.len()
            );
        }
        Self {
            input,
            indices: indices.into(),
        }
    }

    fn derive(&self, indices: Vec<usize>) -> Self {
        Self {
            input: Arc::clone(&self.input),
            indices: indices.into(),
        }
    }

    /// The input this configuration indexes into.
    pub fn input(&self) -> &Arc<Input<T>> {
        &self.input
    }

    /// The retained original indices, in increasing order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of retained elements.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no element is retained.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns true if removed slots materialize as the input's filler.
    pub fn is_replaced(&self) -> bool {
        self.input.is_replaced()
    }

    /// Length of the materialized candidate.
    ///
    /// In replaced mode this is always the input length.
    pub fn materialized_len(&self) -> usize {
        if self.is_replaced() {
            self.input.len()
        } else {
            self.len()
        }
    }

    /// Returns true if the original index `index` is retained.
    pub fn contains_index(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Returns true if every retained index of `self` is retained by `other`.
    pub fn is_subset_of(&self, other: &Configuration<T>) -> bool {
        self.indices.iter().all(|&i| other.contains_index(i))
    }

    /// Split positions `0..len` into `n` contiguous chunks of
    /// `ceil(len / n)` positions; the last chunk may be smaller.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero or larger than a non-empty configuration.
    pub fn partition(&self, n: usize) -> Vec<Range<usize>> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        assert!(n > 0, "granularity must be positive");
        assert!(n <= len, "granularity {n} exceeds configuration length {len}");

        let chunk_size = len.div_ceil(n);
        (0..len)
            .step_by(chunk_size)
            .map(|start| start..(start + chunk_size).min(len))
            .collect()
    }

    /// The chunk at `range` on its own.
    pub fn slice(&self, range: Range<usize>) -> Self {
        self.check_range(&range);
        self.derive(self.indices[range].to_vec())
    }

    /// Everything except the chunk at `range`.
    pub fn complement(&self, range: Range<usize>) -> Self {
        self.without_ranges(std::slice::from_ref(&range))
    }

    /// Everything except the union of `ranges`.
    pub fn without_ranges(&self, ranges: &[Range<usize>]) -> Self {
        for range in ranges {
            self.check_range(range);
        }
        let indices = self
            .indices
            .iter()
            .enumerate()
            .filter(|(pos, _)| !ranges.iter().any(|r| r.contains(pos)))
            .map(|(_, &index)| index)
            .collect();
        self.derive(indices)
    }

    /// Everything except the element at `position`.
    pub fn without(&self, position: usize) -> Self {
        self.complement(position..position + 1)
    }

    /// Only the elements at `positions` (sorted, unique).
    pub fn select(&self, positions: &[usize]) -> Self {
        self.check_positions(positions);
        self.derive(positions.iter().map(|&p| self.indices[p]).collect())
    }

    /// Everything except the elements at `positions` (sorted, unique).
    pub fn remove_positions(&self, positions: &[usize]) -> Self {
        self.check_positions(positions);
        let indices = self
            .indices
            .iter()
            .enumerate()
            .filter(|(pos, _)| positions.binary_search(pos).is_err())
            .map(|(_, &index)| index)
            .collect();
        self.derive(indices)
    }

    /// Iterate over the retained elements.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.indices.iter().map(move |&i| &self.input[i])
    }

    fn check_range(&self, range: &Range<usize>) {
        assert!(
            range.start <= range.end && range.end <= self.len(),
            "range {:?} out of bounds for configuration of length {}",
            range,
            self.len()
        );
    }

    fn check_positions(&self, positions: &[usize]) {
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "positions must be sorted and unique"
        );
        if let Some(&last) = positions.last() {
            assert!(
                last < self.len(),
                "position {} out of bounds for configuration of length {}",
                last,
                self.len()
            );
        }
    }
}

impl<T: Clone> Configuration<T> {
    /// Build the concrete candidate.
    ///
    /// Without a filler this is the retained elements in original order. In
    /// replaced mode it is the full input with every removed slot set to the
    /// filler.
    pub fn materialize(&self) -> Vec<T> {
        match self.input.filler() {
            None => self.iter().cloned().collect(),
            Some(filler) => {
                let mut out = Vec::with_capacity(self.input.len());
                let mut kept = self.indices.iter().peekable();
                for (i, element) in self.input.elements().iter().enumerate() {
                    if kept.peek() == Some(&&i) {
                        kept.next();
                        out.push(element.clone());
                    } else {
                        out.push(filler.clone());
                    }
                }
                out
            }
        }
    }
}

impl<T> PartialEq for Configuration<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.input, &other.input) && self.indices == other.indices
    }
}

impl<T> Eq for Configuration<T> {}

impl<T> Hash for Configuration<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.indices.hash(state);
    }
}

impl<T> fmt::Debug for Configuration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Configuration").field(&self.indices).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize) -> Configuration<usize> {
        Configuration::full(Input::new((0..n).collect()).into_shared())
    }

    #[test]
    fn test_full_and_empty() {
        let c = config(4);
        assert_eq!(c.len(), 4);
        assert_eq!(c.indices(), &[0, 1, 2, 3]);

        let e = Configuration::empty(Arc::clone(c.input()));
        assert!(e.is_empty());
        assert!(e.is_subset_of(&c));
    }

    #[test]
    fn test_partition() {
        let c = config(10);
        assert_eq!(c.partition(2), vec![0..5, 5..10]);
        assert_eq!(c.partition(3), vec![0..4, 4..8, 8..10]);
        assert_eq!(c.partition(10).len(), 10);
        assert!(config(0).partition(2).is_empty());
    }

    #[test]
    #[should_panic(expected = "exceeds configuration length")]
    fn test_partition_too_fine() {
        config(3).partition(4);
    }

    #[test]
    fn test_complement_and_slice() {
        let c = config(6);
        let rest = c.complement(2..4);
        assert_eq!(rest.indices(), &[0, 1, 4, 5]);

        let chunk = rest.slice(1..3);
        assert_eq!(chunk.indices(), &[1, 4]);

        // Derived configurations leave their source untouched.
        assert_eq!(c.len(), 6);
        assert!(chunk.is_subset_of(&rest));
        assert!(!c.is_subset_of(&rest));
    }

    #[test]
    fn test_without_ranges() {
        let c = config(8);
        let r = c.without_ranges(&[0..2, 5..7]);
        assert_eq!(r.indices(), &[2, 3, 4, 7]);
        assert_eq!(r.without(0).indices(), &[3, 4, 7]);
    }

    #[test]
    fn test_select_and_remove_positions() {
        let c = config(6).complement(0..1);
        assert_eq!(c.select(&[0, 3]).indices(), &[1, 4]);
        assert_eq!(c.remove_positions(&[0, 3]).indices(), &[2, 3, 5]);
    }

    #[test]
    #[should_panic(expected = "sorted and unique")]
    fn test_from_indices_rejects_unsorted() {
        let input = Input::new(vec![1, 2, 3]).into_shared();
        Configuration::from_indices(input, vec![2, 1]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_complement_rejects_bad_range() {
        config(3).complement(2..5);
    }

    #[test]
    fn test_materialize_plain() {
        let input = Input::new(vec!['a', 'b', 'c', 'd']).into_shared();
        let c = Configuration::from_indices(input, vec![1, 3]);
        assert_eq!(c.materialize(), vec!['b', 'd']);
        assert_eq!(c.materialized_len(), 2);
    }

    #[test]
    fn test_materialize_replaced_keeps_length() {
        let input = Input::replaced(vec![1u8, 2, 3, 4, 5], 0).into_shared();
        let c = Configuration::full(input).complement(1..4);
        assert_eq!(c.len(), 2);
        assert_eq!(c.materialized_len(), 5);
        assert_eq!(c.materialize(), vec![1, 0, 0, 0, 5]);
    }

    #[test]
    fn test_equality_requires_same_input() {
        let a = config(3);
        let b = config(3);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.complement(0..1), a.complement(0..1));
    }
}
