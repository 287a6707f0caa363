use super::MatchStrategy;
use crate::UnlocatedReason;
use std::collections::HashMap;

/// Byte span `[start, end)` of a located correction in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub start: usize,
    pub end: usize,
}

impl Anchor {
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn overlaps(&self, other: &Anchor) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Left-to-right substring search over one text.
///
/// With [`MatchStrategy::Successive`] the locator remembers, per distinct
/// original substring, where the previous match ended so that repeated
/// corrections claim successive occurrences instead of the first one again.
pub struct Locator<'t> {
    text: &'t str,
    strategy: MatchStrategy,
    cursors: HashMap<String, usize>,
}

impl<'t> Locator<'t> {
    pub fn new(text: &'t str, strategy: MatchStrategy) -> Self {
        Self {
            text,
            strategy,
            cursors: HashMap::new(),
        }
    }

    pub fn locate(&mut self, original: &str) -> Result<Anchor, UnlocatedReason> {
        // An empty needle matches everywhere; that is not a location.
        if original.is_empty() {
            return Err(UnlocatedReason::EmptyOriginal);
        }

        match self.strategy {
            MatchStrategy::FirstOccurrence => self
                .text
                .find(original)
                .map(|start| Anchor {
                    start,
                    end: start + original.len(),
                })
                .ok_or(UnlocatedReason::NotFound),
            MatchStrategy::Successive => {
                let from = self.cursors.get(original).copied().unwrap_or(0);
                match self.text[from..].find(original) {
                    Some(relative) => {
                        let start = from + relative;
                        let end = start + original.len();
                        self.cursors.insert(original.to_string(), end);
                        Ok(Anchor { start, end })
                    }
                    None if from == 0 => Err(UnlocatedReason::NotFound),
                    None => Err(UnlocatedReason::Exhausted),
                }
            }
        }
    }
}

/// The slice of `text` spanning `radius` chars either side of `anchor`,
/// clipped to the text boundaries, and the byte offset of the anchor within it.
pub fn context_window<'t>(text: &'t str, anchor: Anchor, radius: usize) -> (&'t str, usize) {
    let start = back_chars(text, anchor.start, radius);
    let end = forward_chars(text, anchor.end, radius);
    (&text[start..end], anchor.start - start)
}

fn back_chars(text: &str, byte: usize, n: usize) -> usize {
    if n == 0 {
        return byte;
    }
    text[..byte]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map_or(0, |(i, _)| i)
}

fn forward_chars(text: &str, byte: usize, n: usize) -> usize {
    text[byte..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| byte + i)
}
