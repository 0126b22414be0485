//! Turning structured text into trees and back.
//!
//! [`DelimiterParser`] builds a tree of [`Fragment`]s from bracket nesting:
//! every bracketed group becomes a node whose children are the text and
//! groups inside it. Text is split into leaves after `;` and after each
//! newline, so statements and lines can be removed individually.
//!
//! [`FragmentPrinter`] prints the tree back. A pruned group prints as an
//! empty pair of its delimiters, which keeps every candidate balanced; a
//! pruned text leaf prints as nothing.

use tracing::debug;

use deltamin_core::{NodeId, PrintError, Tree, TreeBuilder, TreePrinter};

use crate::error::{DebugError, Result};

/// Parses raw text into a tree for hierarchical reduction.
pub trait TreeParser<T>: Send + Sync {
    /// Build the tree for `raw`.
    fn parse(&self, raw: &str) -> Result<Tree<T>>;
}

/// A piece of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// The top level; prints only its children.
    Sequence,
    /// A bracketed group.
    Group { open: char, close: char },
    /// Literal text.
    Text(String),
}

impl Fragment {
    /// Create a text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Splits text on matching bracket pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterParser {
    pairs: Vec<(char, char)>,
}

impl Default for DelimiterParser {
    fn default() -> Self {
        Self {
            pairs: vec![('{', '}')],
        }
    }
}

impl DelimiterParser {
    /// Create a parser that nests on `{` and `}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also nest on `open` and `close`.
    pub fn with_pair(mut self, open: char, close: char) -> Self {
        if !self.pairs.contains(&(open, close)) {
            self.pairs.push((open, close));
        }
        self
    }

    /// The bracket pairs this parser nests on.
    pub fn pairs(&self) -> &[(char, char)] {
        &self.pairs
    }

    fn closer_for(&self, open: char) -> Option<char> {
        self.pairs
            .iter()
            .find(|(o, _)| *o == open)
            .map(|(_, c)| *c)
    }

    fn is_closer(&self, ch: char) -> bool {
        self.pairs.iter().any(|(_, c)| *c == ch)
    }
}

fn flush(builder: &mut TreeBuilder<Fragment>, parent: NodeId, text: &mut String) {
    if !text.is_empty() {
        builder.add_child(parent, Fragment::Text(std::mem::take(text)));
    }
}

impl TreeParser<Fragment> for DelimiterParser {
    fn parse(&self, raw: &str) -> Result<Tree<Fragment>> {
        let mut builder = TreeBuilder::new(Fragment::Sequence);
        let mut current = builder.root();
        let mut open_groups: Vec<(NodeId, char, usize)> = Vec::new();
        let mut text = String::new();

        for (offset, ch) in raw.char_indices() {
            if let Some(close) = self.closer_for(ch) {
                flush(&mut builder, current, &mut text);
                let group = Fragment::Group { open: ch, close };
                let id = builder.add_child_with_placeholder(current, group.clone(), group);
                open_groups.push((current, close, offset));
                current = id;
            } else if self.is_closer(ch) {
                flush(&mut builder, current, &mut text);
                match open_groups.pop() {
                    Some((parent, expected, _)) if expected == ch => current = parent,
                    Some((_, expected, _)) => {
                        return Err(DebugError::parse(
                            offset,
                            format!("expected '{}', found '{}'", expected, ch),
                        ));
                    }
                    None => {
                        return Err(DebugError::parse(offset, format!("unmatched '{}'", ch)));
                    }
                }
            } else {
                text.push(ch);
                if ch == ';' || ch == '\n' {
                    flush(&mut builder, current, &mut text);
                }
            }
        }
        flush(&mut builder, current, &mut text);

        if let Some((_, expected, offset)) = open_groups.pop() {
            return Err(DebugError::parse(
                offset,
                format!("group is never closed, expected '{}'", expected),
            ));
        }

        let tree = builder.build();
        debug!(
            nodes = tree.arena_len(),
            max_depth = tree.max_depth(),
            "Parsed delimiter tree"
        );
        Ok(tree)
    }
}

/// Prints a [`Fragment`] tree back to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentPrinter;

enum Step {
    Enter(NodeId),
    Close(char),
}

fn push_placeholder(out: &mut String, placeholder: &Fragment) {
    match placeholder {
        Fragment::Sequence => {}
        Fragment::Group { open, close } => {
            out.push(*open);
            out.push(*close);
        }
        Fragment::Text(text) => out.push_str(text),
    }
}

impl TreePrinter<Fragment> for FragmentPrinter {
    type Output = String;

    fn print(&self, tree: &Tree<Fragment>) -> std::result::Result<String, PrintError> {
        let mut out = String::new();
        let mut steps = vec![Step::Enter(tree.root())];

        while let Some(step) = steps.pop() {
            let id = match step {
                Step::Close(close) => {
                    out.push(close);
                    continue;
                }
                Step::Enter(id) => id,
            };

            let node = tree.node(id);
            if tree.is_pruned(id) {
                if let Some(placeholder) = node.placeholder() {
                    push_placeholder(&mut out, placeholder);
                }
                continue;
            }

            match node.value() {
                Fragment::Text(text) => {
                    if !node.is_leaf() {
                        return Err(PrintError::invalid_node(
                            id.index(),
                            "text fragment has children",
                        ));
                    }
                    out.push_str(text);
                }
                Fragment::Group { open, close } => {
                    out.push(*open);
                    steps.push(Step::Close(*close));
                }
                Fragment::Sequence => {}
            }
            steps.extend(node.children().iter().rev().map(|&child| Step::Enter(child)));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "int main() {\n  int x;\n  if (x) { crash(); }\n  return 0;\n}\n";

    fn leaves(tree: &Tree<Fragment>) -> Vec<String> {
        tree.frontier()
            .into_iter()
            .filter_map(|f| match f {
                Fragment::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let tree = DelimiterParser::new().parse(PROGRAM).unwrap();
        assert_eq!(FragmentPrinter.print(&tree).unwrap(), PROGRAM);
        assert_eq!(tree.max_depth(), 3);
    }

    #[test]
    fn test_leaves_split_after_separators() {
        let tree = DelimiterParser::new().parse("a; b;\nc").unwrap();
        assert_eq!(leaves(&tree), vec!["a;", " b;", "\n", "c"]);
    }

    #[test]
    fn test_pruned_group_prints_empty_pair() {
        let tree = DelimiterParser::new().parse(PROGRAM).unwrap();
        let inner = tree
            .level(2)
            .into_iter()
            .find(|&id| matches!(tree.node(id).value(), Fragment::Group { .. }))
            .unwrap();

        let pruned = tree.with_pruned(&[inner]);
        assert_eq!(
            FragmentPrinter.print(&pruned).unwrap(),
            "int main() {\n  int x;\n  if (x) {}\n  return 0;\n}\n"
        );
    }

    #[test]
    fn test_extra_pairs() {
        let parser = DelimiterParser::new().with_pair('(', ')');
        let tree = parser.parse("f(a;b) {c}").unwrap();

        assert_eq!(tree.level(1).len(), 4);
        let groups = tree
            .level(1)
            .into_iter()
            .filter(|&id| matches!(tree.node(id).value(), Fragment::Group { .. }))
            .count();
        assert_eq!(groups, 2);
        assert_eq!(FragmentPrinter.print(&tree).unwrap(), "f(a;b) {c}");
    }

    #[test]
    fn test_unbalanced_input() {
        let parser = DelimiterParser::new().with_pair('(', ')');

        let err = parser.parse("{ a; ").unwrap_err();
        assert!(matches!(err, DebugError::Parse { offset: 0, .. }));

        let err = parser.parse("a; }").unwrap_err();
        assert!(matches!(err, DebugError::Parse { offset: 3, .. }));

        let err = parser.parse("{ (a; }").unwrap_err();
        assert!(matches!(err, DebugError::Parse { offset: 6, .. }));
    }

    #[test]
    fn test_text_with_children_is_unprintable() {
        let mut builder = TreeBuilder::new(Fragment::Sequence);
        let root = builder.root();
        let text = builder.add_child(root, Fragment::text("a"));
        builder.add_child(text, Fragment::text("b"));

        let err = FragmentPrinter.print(&builder.build()).unwrap_err();
        assert!(matches!(err, PrintError::InvalidNode { node: 1, .. }));
    }
}
