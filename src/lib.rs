pub mod annotate;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod request;
pub mod text;

pub use annotate::{annotate, AnnotateOptions, AnnotationResult, Annotator, Consistency};
pub use config::Config;
pub use envelope::Envelope;
pub use error::{AnnotateError, Result};
pub use request::{AnnotationRequest, ModelOutput};

use serde::{Deserialize, Serialize};

/// A model-proposed replacement of `original` (as it appears in the source text) by `corrected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

impl Correction {
    pub fn new(original: impl Into<String>, corrected: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Spelling,
}

/// Why a correction could not be anchored onto the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlocatedReason {
    /// The original substring does not occur in the text.
    NotFound,
    /// The original substring is empty.
    EmptyOriginal,
    /// Every occurrence was already claimed by an earlier correction.
    Exhausted,
}

/// Position of an issue in the original text, in the configured offset unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Located { offset: usize, length: usize },
    Unlocated { reason: UnlocatedReason, length: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub word: String,
    pub location: Location,
    pub suggestions: Vec<String>,
    pub context: String,
    /// Byte offset of `word` within `context`; zero when unlocated.
    pub context_offset: usize,
}

impl Issue {
    pub fn is_located(&self) -> bool {
        matches!(self.location, Location::Located { .. })
    }

    /// Offset of the span, or `None` when the correction was not located.
    pub fn offset(&self) -> Option<usize> {
        match self.location {
            Location::Located { offset, .. } => Some(offset),
            Location::Unlocated { .. } => None,
        }
    }

    /// The context split around the located word: `(before, word, after)`.
    pub fn highlight(&self) -> Option<(&str, &str, &str)> {
        if !self.is_located() {
            return None;
        }
        let start = self.context_offset;
        let end = start + self.word.len();
        Some((
            self.context.get(..start)?,
            self.context.get(start..end)?,
            self.context.get(end..)?,
        ))
    }

    pub fn length(&self) -> usize {
        match self.location {
            Location::Located { length, .. } | Location::Unlocated { length, .. } => length,
        }
    }
}
