//! Deterministic text cleanup for generated stories.
//!
//! The refine stage asks the oracle to repair its own artifacts, but the
//! guarantees live here: a pure text-to-text pass that re-inserts dropped
//! possessive apostrophes over a fixed noun dictionary, splices an
//! em-dash where an article got fused onto the previous word, restores
//! missing spaces before auxiliary verbs, and normalizes whitespace.
//! Same input, same output, no oracle involved.

use lazy_static::lazy_static;
use regex::Regex;

/// Nouns that commonly follow a possessive in generated prose. A
/// plural-looking word directly before one of these is treated as a
/// possessive with a dropped apostrophe.
const POSSESSIVE_NOUNS: [&str; 21] = [
    "processor",
    "avatar",
    "voice",
    "heart",
    "mind",
    "eye",
    "eyes",
    "face",
    "hand",
    "hands",
    "body",
    "screen",
    "companion",
    "tablet",
    "window",
    "room",
    "world",
    "life",
    "story",
    "memory",
    "thought",
];

lazy_static! {
    static ref POSSESSIVE_FIXES: Vec<(Regex, String)> = POSSESSIVE_NOUNS
        .iter()
        .map(|noun| {
            let pattern = Regex::new(&format!(r"(\w+)s\s+{noun}")).expect("valid regex");
            (pattern, format!("${{1}}'s {noun}"))
        })
        .collect();
    static ref FUSED_A: Regex = Regex::new(r"([a-z])a\s+").expect("valid regex");
    static ref FUSED_AN: Regex = Regex::new(r"([a-z])an\s+").expect("valid regex");
    static ref FUSED_AUXILIARY: Regex =
        Regex::new(r"([a-z])(was|is|are|were|been|had|have|has)\b").expect("valid regex");
    static ref HORIZONTAL_RUNS: Regex = Regex::new(r"[ \t]+").expect("valid regex");
    static ref EXTRA_NEWLINES: Regex = Regex::new(r"\n{3,}").expect("valid regex");
}

/// Fix common generation artifacts in story text.
///
/// Pure and reproducible: identical input yields byte-identical output
/// across invocations. Applied after the refine stage's oracle call,
/// never before.
pub fn clean_story_formatting(text: &str) -> String {
    let mut text = text.to_string();

    // "words processor" -> "word's processor"
    for (pattern, replacement) in POSSESSIVE_FIXES.iter() {
        text = pattern.replace_all(&text, replacement.as_str()).into_owned();
    }

    // "readinga book" -> "reading—a book"
    text = FUSED_A.replace_all(&text, "${1}—a ").into_owned();
    text = FUSED_AN.replace_all(&text, "${1}—an ").into_owned();

    // "lampwas" -> "lamp was"
    text = FUSED_AUXILIARY.replace_all(&text, "${1} ${2}").into_owned();

    // Collapse runs of spaces/tabs; cap blank lines at one.
    text = HORIZONTAL_RUNS.replace_all(&text, " ").into_owned();
    text = EXTRA_NEWLINES.replace_all(&text, "\n\n").into_owned();

    text.trim().to_string()
}

/// Estimate token count from word count.
///
/// Fixed heuristic: tokens ~= 0.75 x words. A declared approximation
/// for pacing the draft and refine stages, not exact token accounting.
pub fn estimate_tokens(text: &str) -> usize {
    (word_count(text) as f64 * 0.75) as usize
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Maximum slug length in a story filename.
const SLUG_CHARS: usize = 50;

/// Derive a filesystem-safe slug from a story topic.
pub fn topic_slug(topic: &str) -> String {
    let slug: String = topic
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    slug.chars().take(SLUG_CHARS).collect()
}
