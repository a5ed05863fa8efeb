//! Boundary-checked regex scanning
//!
//! The `regex` crate has no look-around. Patterns that must not touch a
//! neighbouring character are matched plainly and then checked here; a
//! rejected match restarts the search one character after its start, which
//! reproduces what a look-behind/look-ahead pair would accept.

use regex::{Match, Regex};
use std::ops::Range;

/// Constraint on the character adjacent to a match
#[derive(Debug, Clone, Copy)]
pub(crate) enum Edge {
    /// Anything (including text start/end)
    Any,
    /// Must not be an ASCII digit
    NotDigit,
    /// Must be whitespace or the text boundary
    Whitespace,
}

impl Edge {
    fn allows(self, neighbour: Option<char>) -> bool {
        match (self, neighbour) {
            (Edge::Any, _) | (_, None) => true,
            (Edge::NotDigit, Some(c)) => !c.is_ascii_digit(),
            (Edge::Whitespace, Some(c)) => c.is_whitespace(),
        }
    }
}

/// A regex plus the constraints on its surroundings
#[derive(Debug)]
pub(crate) struct BoundedPattern {
    pub regex: Regex,
    pub before: Edge,
    pub after: Edge,
}

impl BoundedPattern {
    pub fn new(pattern: &str, before: Edge, after: Edge) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            before,
            after,
        }
    }

    pub fn plain(pattern: &str) -> Self {
        Self::new(pattern, Edge::Any, Edge::Any)
    }

    /// All non-overlapping matches satisfying both edge constraints
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        let mut found = Vec::new();
        let mut start = 0;

        while start <= text.len() {
            let Some(m) = self.regex.find_at(text, start) else {
                break;
            };

            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();

            if self.before.allows(before) && self.after.allows(after) {
                found.push(m);
                start = if m.end() > m.start() {
                    m.end()
                } else {
                    next_char_boundary(text, m.start())
                };
            } else {
                start = next_char_boundary(text, m.start());
            }
        }

        found
    }
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(at + 1, |c| at + c.len_utf8())
}

/// Digit-only form of a candidate
pub(crate) fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub(crate) fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
