use crate::annotate::{AnnotationResult, Consistency};
use crate::{Issue, IssueKind, Location, UnlocatedReason};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Wire form of an [`Issue`]. Unlocated issues carry `offset: -1` and an empty
/// context alongside `located: false`.
#[derive(Debug, Serialize)]
struct IssueRecord<'a> {
    #[serde(rename = "type")]
    kind: IssueKind,
    word: &'a str,
    offset: i64,
    length: usize,
    suggestions: &'a [String],
    context: &'a str,
    located: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlocated_reason: Option<UnlocatedReason>,
}

impl<'a> From<&'a Issue> for IssueRecord<'a> {
    fn from(issue: &'a Issue) -> Self {
        let (offset, located, unlocated_reason) = match issue.location {
            Location::Located { offset, .. } => (offset as i64, true, None),
            Location::Unlocated { reason, .. } => (-1, false, Some(reason)),
        };
        IssueRecord {
            kind: issue.kind,
            word: &issue.word,
            offset,
            length: issue.length(),
            suggestions: &issue.suggestions,
            context: &issue.context,
            located,
            unlocated_reason,
        }
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IssueRecord::from(self).serialize(serializer)
    }
}

/// API response wrapping an [`AnnotationResult`] with request metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub model: String,
    pub language: String,
    pub issue_count: usize,
    pub timestamp: DateTime<Utc>,
    pub corrected_text: String,
    pub issues: Vec<Issue>,
    pub consistency: Consistency,
    #[serde(skip_serializing_if = "is_zero")]
    pub dropped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Envelope {
    pub fn new(
        result: AnnotationResult,
        model: impl Into<String>,
        language: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            model: model.into(),
            language: language.into(),
            issue_count: result.issues.len(),
            timestamp,
            corrected_text: result.corrected_text,
            issues: result.issues,
            consistency: result.consistency,
            dropped: result.dropped,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
