//! The original, failure-inducing input.

use std::fmt;
use std::sync::Arc;

/// A failure-inducing input: the full element sequence every
/// [`Configuration`](crate::Configuration) indexes into.
///
/// An input with a filler runs in replaced mode: removing an element puts the
/// filler in its slot instead of deleting it, so materialized candidates keep
/// the original length and offsets.
#[derive(Clone, PartialEq, Eq)]
pub struct Input<T> {
    elements: Vec<T>,
    filler: Option<T>,
}

impl<T> Input<T> {
    /// Create an input whose removals delete elements.
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            elements,
            filler: None,
        }
    }

    /// Create an input in replaced mode.
    pub fn replaced(elements: Vec<T>, filler: T) -> Self {
        Self {
            elements,
            filler: Some(filler),
        }
    }

    /// Wrap the input for sharing between configurations.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of elements in the input.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the input has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true if removals substitute the filler.
    pub fn is_replaced(&self) -> bool {
        self.filler.is_some()
    }

    /// The filler value, if running in replaced mode.
    pub fn filler(&self) -> Option<&T> {
        self.filler.as_ref()
    }

    /// Element at `index` of the original input.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// All elements of the original input.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }
}

impl<T> std::ops::Index<usize> for Input<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.elements[index]
    }
}

impl<T: fmt::Debug> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("len", &self.elements.len())
            .field("replaced", &self.filler.is_some())
            .finish()
    }
}

impl<T> From<Vec<T>> for Input<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}
