//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a declared path into literal and parameter segments
//! - Match a concrete request path against the compiled segments
//! - Return captured parameter values in declaration order
//!
//! # Design Decisions
//! - Matching is anchored: segment counts must be equal
//! - A parameter captures exactly one non-empty segment (never a `/`)
//! - Captures are returned verbatim, no percent-decoding
//! - Literal segments compare byte-for-byte (case-sensitive)

/// Character introducing a named parameter segment.
pub const PARAM_MARKER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A compiled path pattern with one capture per `:name` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    captures: usize,
}

impl PathPattern {
    /// Compile a declared route path.
    pub fn compile(path: &str) -> Self {
        let segments: Vec<Segment> = path
            .split('/')
            .map(|segment| {
                if segment.starts_with(PARAM_MARKER) {
                    Segment::Param
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        let captures = segments.iter().filter(|s| **s == Segment::Param).count();

        Self { segments, captures }
    }

    /// Number of capture groups in this pattern.
    pub fn capture_count(&self) -> usize {
        self.captures
    }

    /// Match the full path, returning the captured values in order.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let mut values = Vec::with_capacity(self.captures);
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param if part.is_empty() => return None,
                Segment::Param => values.push(part),
            }
        }

        // Extra trailing segments mean the path is longer than the pattern.
        if parts.next().is_some() {
            return None;
        }

        Some(values)
    }

    /// Returns true if the path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }
}

/// Literal prefix of a path up to its first parameter marker.
pub fn literal_prefix(path: &str) -> &str {
    let mut offset = 0;
    for segment in path.split('/') {
        if segment.starts_with(PARAM_MARKER) {
            return &path[..offset];
        }
        offset += segment.len() + 1;
    }
    path
}

/// Parameter names of a path in left-to-right segment order.
pub fn param_names(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix(PARAM_MARKER))
        .collect()
}
