//! Free-text trigger for the "call the pastor" request.
//!
//! Deliberately permissive: a stray false positive only costs one button
//! message, while a miss leaves the user without a way in.

use once_cell::sync::Lazy;
use regex::Regex;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[@.,!?]").expect("punctuation regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static CALL_THEN_PASTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^| )call( .*)?\b(pastor|pj|p j|jeff)\b").expect("call regex")
});
static VERB_THEN_PASTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^| )(ring|dial|contact|phone|phone\s+call)\b.*\b(pastor|pj|jeff)\b")
        .expect("verb regex")
});
static ANY_CALL_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"call|ring|dial|phone|contact").expect("verb regex"));
static ANY_PASTOR_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pastor|the pastor|pj|p j|jeff").expect("pastor regex"));

const MISSPELLINGS: [&str; 3] = ["paster jeff", "pastor jef", "call paster"];

/// Lower-case, turn `@ . , ! ?` into spaces, collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

pub fn is_call_intent(text: &str) -> bool {
    let t = normalize(text);

    if CALL_THEN_PASTOR.is_match(&t) || VERB_THEN_PASTOR.is_match(&t) {
        return true;
    }
    if MISSPELLINGS.iter().any(|m| t.contains(m)) {
        return true;
    }

    ANY_CALL_VERB.is_match(&t) && ANY_PASTOR_REF.is_match(&t)
}
