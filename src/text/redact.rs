use crate::Result;
use regex::RegexBuilder;
use tracing::debug;

pub const DEFAULT_MARKER: &str = "[REDACTED]";

/// Replace every case-insensitive occurrence of any of `terms` with `marker`.
///
/// Terms are matched literally. Empty terms are ignored, and with no usable
/// terms the text is returned unchanged.
pub fn redact(text: &str, terms: &[String], marker: &str) -> Result<String> {
    let alternation = terms
        .iter()
        .filter(|term| !term.is_empty())
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");

    if alternation.is_empty() {
        return Ok(text.to_string());
    }

    let pattern = RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()?;

    let matches = pattern.find_iter(text).count();
    debug!(terms = terms.len(), matches, "redacting text");

    Ok(pattern.replace_all(text, regex::NoExpand(marker)).into_owned())
}
