//! Dotted paths identifying leaves of a decomposed document.

use std::fmt;

/// An ordered sequence of segment names identifying one leaf in a document.
///
/// Two paths are equal iff their segment sequences are equal. Segments are
/// user-supplied keys; no escaping is applied, so a dot inside a key is
/// indistinguishable from a nesting boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ColumnPath {
    segments: Vec<String>,
}

impl ColumnPath {
    /// Parses a dotted path like `"a.b.c"` into its segments.
    pub fn new(dotted: impl AsRef<str>) -> Self {
        let dotted = dotted.as_ref();
        if dotted.is_empty() {
            return Self::default();
        }
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// The path without its last segment; `None` for root-level paths.
    pub fn parent(&self) -> Option<ColumnPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for ColumnPath {
    fn from(dotted: &str) -> Self {
        Self::new(dotted)
    }
}
