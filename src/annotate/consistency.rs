use super::locate::Anchor;
use serde::Serialize;

/// Agreement between the model's corrected text and its itemized corrections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Consistency {
    /// Replaying the corrections reproduces the corrected text.
    Consistent,
    /// Replaying the corrections yields `replayed`, which differs from the corrected text.
    Mismatch { replayed: String },
    /// A correction was unlocated or two spans overlap, so no replay was attempted.
    Unchecked,
}

/// Replay located corrections onto `text` and compare with `corrected_text`.
///
/// `edits` holds one entry per correction; `None` marks an unlocated one.
pub fn check(text: &str, edits: &[Option<(Anchor, &str)>], corrected_text: &str) -> Consistency {
    let mut located: Vec<(Anchor, &str)> = match edits.iter().copied().collect::<Option<Vec<_>>>() {
        Some(located) => located,
        None => return Consistency::Unchecked,
    };
    located.sort_by_key(|(anchor, _)| anchor.start);

    if located.windows(2).any(|pair| pair[0].0.overlaps(&pair[1].0)) {
        return Consistency::Unchecked;
    }

    let replayed = replay(text, &located);
    if replayed == corrected_text {
        Consistency::Consistent
    } else {
        Consistency::Mismatch { replayed }
    }
}

fn replay(text: &str, sorted: &[(Anchor, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (anchor, replacement) in sorted {
        out.push_str(&text[cursor..anchor.start]);
        out.push_str(replacement);
        cursor = anchor.end;
    }
    out.push_str(&text[cursor..]);
    out
}
