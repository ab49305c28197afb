use proptest::prelude::*;
use regex::Regex;
use storyforge::resolution::{find_references, Reference};

const REFERENCE_REGEX: &str = r"\[([a-zA-Z_][a-zA-Z0-9_]*(?::[a-zA-Z_][a-zA-Z0-9_]*){0,2})\]";

/// (start, end, token) triples from the reference regex.
fn regex_matches(text: &str) -> Vec<(usize, usize, String)> {
    let re = Regex::new(REFERENCE_REGEX).unwrap();
    re.captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            (whole.start(), whole.end(), caps[1].to_string())
        })
        .collect()
}

fn matcher_matches(text: &str) -> Vec<(usize, usize, String)> {
    find_references(text)
        .map(|m| (m.start, m.end, m.token.to_string()))
        .collect()
}

#[test]
fn test_mixed_text_matches_regex() {
    let text = "Intro [alice] meets [character:bob] at [place:tavern:raw]; \
                ignore [a:b:c:d], [9lives], [x-y] and [[nested]] or [trailing";
    assert_eq!(matcher_matches(text), regex_matches(text));
    assert_eq!(
        matcher_matches(text)
            .into_iter()
            .map(|(_, _, t)| t)
            .collect::<Vec<_>>(),
        vec!["alice", "character:bob", "place:tavern:raw", "nested"]
    );
}

#[test]
fn test_four_segment_token_is_not_partially_matched() {
    assert!(matcher_matches("[a:b:c:d]").is_empty());
    assert!(regex_matches("[a:b:c:d]").is_empty());
}

#[test]
fn test_every_match_parses_to_a_reference() {
    let text = "[a] [a:b] [a:b:c] [_x1:y_2]";
    for m in find_references(text) {
        let parsed = Reference::parse(m.token).expect("matched tokens always parse");
        assert_eq!(parsed.segment_count(), m.token.split(':').count());
    }
}

proptest! {
    #[test]
    fn matcher_agrees_with_captures_iter(text in r"[\[\]:a-c_0-9 é]{0,40}") {
        prop_assert_eq!(matcher_matches(&text), regex_matches(&text));
    }

    #[test]
    fn matcher_never_panics_on_arbitrary_text(text in any::<String>()) {
        let _ = matcher_matches(&text);
    }
}
