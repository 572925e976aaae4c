//! Source spans and the `Spanned<T>` wrapper used throughout the AST.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span in the source code, represented as byte offsets.
pub type Span = Range<usize>;

/// A value with an associated source span.
///
/// Every AST node is wrapped in `Spanned` so diagnostics and IDE-style
/// tooling can point back at the exact source location that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }

    pub fn as_ref(&self) -> Spanned<&T> {
        Spanned {
            node: &self.node,
            span: self.span.clone(),
        }
    }
}

/// Convert a byte offset into a 1-indexed (line, column) pair.
///
/// Used both by the parser's error formatter and by the diagnostic
/// reporter so "on line N" always agrees with source text.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
