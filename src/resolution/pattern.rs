//! Matcher for bracketed reference tokens.
//!
//! Recognizes `[seg]`, `[seg:seg]` and `[seg:seg:seg]` where every segment is
//! an ASCII identifier (`[A-Za-z_][A-Za-z0-9_]*`). Matches are found
//! leftmost-first and never overlap. Bracket content that does not fit the
//! grammar is skipped.

use std::iter::FusedIterator;

use once_cell::sync::Lazy;
use regex::Regex;

/// Reference token grammar; group 1 is the token without its brackets.
pub const REFERENCE_PATTERN: &str =
    r"\[([a-zA-Z_][a-zA-Z0-9_]*(?::[a-zA-Z_][a-zA-Z0-9_]*){0,2})\]";

static REFERENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(REFERENCE_PATTERN).expect("reference pattern compiles"));

/// One reference token found in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMatch<'t> {
    /// Byte offset of the opening `[`.
    pub start: usize,
    /// Byte offset just past the closing `]`.
    pub end: usize,
    /// The text between the brackets, segments still colon-joined.
    pub token: &'t str,
    matched: &'t str,
}

impl<'t> ReferenceMatch<'t> {
    /// The whole bracketed token, brackets included.
    pub fn as_str(&self) -> &'t str {
        self.matched
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Lazy iterator over the reference tokens of a text.
///
/// Cloning the iterator (or calling [`find_references`] again) restarts the
/// scan independently.
#[derive(Debug, Clone)]
pub struct ReferenceMatches<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Iterator for ReferenceMatches<'t> {
    type Item = ReferenceMatch<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.text.len() {
            return None;
        }

        let Some(caps) = REFERENCE_REGEX.captures_at(self.text, self.pos) else {
            self.pos = self.text.len() + 1;
            return None;
        };
        let (whole, token) = (caps.get(0)?, caps.get(1)?);

        // Tokens are never empty, so advancing to the end cannot stall.
        self.pos = whole.end();
        Some(ReferenceMatch {
            start: whole.start(),
            end: whole.end(),
            token: token.as_str(),
            matched: whole.as_str(),
        })
    }
}

impl FusedIterator for ReferenceMatches<'_> {}

/// Returns a lazy iterator over every reference token in `text`.
pub fn find_references(text: &str) -> ReferenceMatches<'_> {
    ReferenceMatches { text, pos: 0 }
}

/// Returns `true` if `text` contains at least one reference token.
pub fn contains_reference(text: &str) -> bool {
    REFERENCE_REGEX.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<&str> {
        find_references(text).map(|m| m.token).collect()
    }

    #[test]
    fn test_all_token_shapes() {
        assert_eq!(
            tokens("[a] [cat:b] [b:stage] [cat:b:stage]"),
            vec!["a", "cat:b", "b:stage", "cat:b:stage"]
        );
    }

    #[test]
    fn test_rejects_four_segments() {
        assert!(tokens("[a:b:c:d]").is_empty());
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        assert!(tokens("[1abc] [a-b] [] [a:] [:a] [a::b] [a b]").is_empty());
    }

    #[test]
    fn test_restarts_after_failed_open_bracket() {
        assert_eq!(tokens("[[alice]]"), vec!["alice"]);
        assert_eq!(tokens("[x[alice]"), vec!["alice"]);
    }

    #[test]
    fn test_spans_cover_brackets() {
        let text = "see [alice] now";
        let m = find_references(text).next().unwrap();
        assert_eq!(m.range(), 4..11);
        assert_eq!(m.as_str(), "[alice]");
        assert_eq!(&text[m.range()], "[alice]");
    }

    #[test]
    fn test_non_ascii_text_around_tokens() {
        assert_eq!(tokens("héllo [bob] wörld [ünï]"), vec!["bob"]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let matches = find_references("[a] [b]");
        let first: Vec<_> = matches.clone().collect();
        let second: Vec<_> = matches.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_contains_reference() {
        assert!(contains_reference("x [y] z"));
        assert!(!contains_reference("no refs [here!]"));
    }
}
