//! Error types for the core data model.

use thiserror::Error;

/// A tree could not be serialized back to its raw form.
#[derive(Debug, Error)]
pub enum PrintError {
    /// The pruned tree has no valid raw form.
    #[error("tree is not printable: {0}")]
    Unprintable(String),

    /// A node carries content the printer cannot render.
    #[error("node {node} cannot be printed: {reason}")]
    InvalidNode { node: usize, reason: String },
}

impl PrintError {
    /// Creates a new unprintable-tree error.
    pub fn unprintable(reason: impl Into<String>) -> Self {
        Self::Unprintable(reason.into())
    }

    /// Creates a new invalid-node error.
    pub fn invalid_node(node: usize, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            node,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_display() {
        let err = PrintError::unprintable("unbalanced braces");
        assert_eq!(err.to_string(), "tree is not printable: unbalanced braces");

        let err = PrintError::invalid_node(4, "empty token");
        assert_eq!(err.to_string(), "node 4 cannot be printed: empty token");
    }
}
