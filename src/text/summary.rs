use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Sentence terminator followed by at least one space.
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?] +").expect("sentence pattern is valid");
}

/// Text up to and including the first `.`, `!` or `?` that is followed by a
/// space. Text without such a break is returned whole.
pub fn summarize(text: &str) -> String {
    match SENTENCE_END.find(text) {
        Some(end) => text[..end.start() + 1].to_string(),
        None => text.to_string(),
    }
}
