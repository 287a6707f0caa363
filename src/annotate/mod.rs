pub mod consistency;
pub mod locate;

pub use consistency::Consistency;

use crate::request::{AnnotationRequest, ModelOutput};
use crate::{AnnotateError, Config, Issue, IssueKind, Location, Result};
use locate::{context_window, Locator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How repeated corrections of the same substring are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Every correction anchors to the first occurrence of its substring.
    #[default]
    #[serde(rename = "first")]
    FirstOccurrence,
    /// Each correction claims the next unclaimed occurrence of its substring.
    #[serde(rename = "successive")]
    Successive,
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(MatchStrategy::FirstOccurrence),
            "successive" => Ok(MatchStrategy::Successive),
            _ => Err(format!("Unknown match strategy: {}", s)),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::FirstOccurrence => write!(f, "first"),
            MatchStrategy::Successive => write!(f, "successive"),
        }
    }
}

/// What to do with corrections whose substring cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlocatedPolicy {
    /// Return them as unlocated issues.
    #[default]
    Keep,
    /// Leave them out of the issue list.
    Drop,
    /// Fail the whole call.
    Fail,
}

impl FromStr for UnlocatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(UnlocatedPolicy::Keep),
            "drop" => Ok(UnlocatedPolicy::Drop),
            "fail" => Ok(UnlocatedPolicy::Fail),
            _ => Err(format!("Unknown unlocated policy: {}", s)),
        }
    }
}

impl fmt::Display for UnlocatedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlocatedPolicy::Keep => write!(f, "keep"),
            UnlocatedPolicy::Drop => write!(f, "drop"),
            UnlocatedPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Unit in which offsets and lengths are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetUnit {
    /// Unicode scalar values.
    #[default]
    Char,
    /// UTF-16 code units, as JavaScript strings index.
    Utf16,
    /// UTF-8 bytes.
    Byte,
}

impl OffsetUnit {
    pub fn measure(self, s: &str) -> usize {
        match self {
            OffsetUnit::Char => s.chars().count(),
            OffsetUnit::Utf16 => s.encode_utf16().count(),
            OffsetUnit::Byte => s.len(),
        }
    }
}

impl FromStr for OffsetUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "char" => Ok(OffsetUnit::Char),
            "utf16" | "utf-16" => Ok(OffsetUnit::Utf16),
            "byte" => Ok(OffsetUnit::Byte),
            _ => Err(format!("Unknown offset unit: {}", s)),
        }
    }
}

impl fmt::Display for OffsetUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetUnit::Char => write!(f, "char"),
            OffsetUnit::Utf16 => write!(f, "utf16"),
            OffsetUnit::Byte => write!(f, "byte"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Chars of surrounding text kept on each side of a located span.
    pub context_radius: usize,
    pub match_strategy: MatchStrategy,
    pub unlocated_policy: UnlocatedPolicy,
    pub offset_unit: OffsetUnit,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            context_radius: 10,
            match_strategy: MatchStrategy::default(),
            unlocated_policy: UnlocatedPolicy::default(),
            offset_unit: OffsetUnit::default(),
        }
    }
}

impl From<&Config> for AnnotateOptions {
    fn from(config: &Config) -> Self {
        Self {
            context_radius: config.context_radius,
            match_strategy: config.match_strategy,
            unlocated_policy: config.unlocated_policy,
            offset_unit: config.offset_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationResult {
    /// Corrected text exactly as the model reported it.
    pub corrected_text: String,
    /// One issue per correction, in input order (minus any dropped ones).
    pub issues: Vec<Issue>,
    pub consistency: Consistency,
    /// Unlocated issues removed under [`UnlocatedPolicy::Drop`].
    pub dropped: usize,
}

impl AnnotationResult {
    pub fn unlocated_count(&self) -> usize {
        self.issues.iter().filter(|issue| !issue.is_located()).count()
    }
}

/// Anchor each of the model's corrections onto `text`.
///
/// Individual corrections never fail the call unless the policy is
/// [`UnlocatedPolicy::Fail`]; they degrade to unlocated issues instead.
pub fn annotate(
    text: &str,
    output: &ModelOutput,
    options: &AnnotateOptions,
) -> Result<AnnotationResult> {
    let unit = options.offset_unit;
    let mut locator = Locator::new(text, options.match_strategy);
    let mut issues = Vec::with_capacity(output.corrections.len());
    let mut edits = Vec::with_capacity(output.corrections.len());

    for (index, correction) in output.corrections.iter().enumerate() {
        let (location, context, context_offset) = match locator.locate(&correction.original) {
            Ok(anchor) => {
                debug!(index, start = anchor.start, end = anchor.end, "located correction");
                edits.push(Some((anchor, correction.corrected.as_str())));
                let location = Location::Located {
                    offset: unit.measure(&text[..anchor.start]),
                    length: unit.measure(anchor.slice(text)),
                };
                let (context, context_offset) = context_window(text, anchor, options.context_radius);
                (location, context.to_string(), context_offset)
            }
            Err(reason) => {
                warn!(index, word = %correction.original, ?reason, "correction could not be located");
                edits.push(None);
                let location = Location::Unlocated {
                    reason,
                    length: unit.measure(&correction.original),
                };
                (location, String::new(), 0)
            }
        };

        issues.push(Issue {
            kind: IssueKind::Spelling,
            word: correction.original.clone(),
            location,
            suggestions: vec![correction.corrected.clone()],
            context,
            context_offset,
        });
    }

    let consistency = consistency::check(text, &edits, &output.corrected);
    if let Consistency::Mismatch { replayed } = &consistency {
        warn!(
            corrected = %output.corrected,
            %replayed,
            "corrected text disagrees with itemized corrections"
        );
    }

    let mut dropped = 0;
    match options.unlocated_policy {
        UnlocatedPolicy::Keep => {}
        UnlocatedPolicy::Drop => {
            let before = issues.len();
            issues.retain(Issue::is_located);
            dropped = before - issues.len();
        }
        UnlocatedPolicy::Fail => {
            let indices: Vec<usize> = issues
                .iter()
                .enumerate()
                .filter(|(_, issue)| !issue.is_located())
                .map(|(index, _)| index)
                .collect();
            if !indices.is_empty() {
                return Err(AnnotateError::Unlocated { indices });
            }
        }
    }

    Ok(AnnotationResult {
        corrected_text: output.corrected.clone(),
        issues,
        consistency,
        dropped,
    })
}

/// Annotation with the request-level limits from [`Config`] applied.
pub struct Annotator {
    options: AnnotateOptions,
    max_text_len: usize,
}

impl Annotator {
    pub fn new(config: &Config) -> Self {
        Self {
            options: AnnotateOptions::from(config),
            max_text_len: config.max_text_len,
        }
    }

    pub fn options(&self) -> &AnnotateOptions {
        &self.options
    }

    pub fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationResult> {
        let len = request.text.chars().count();
        if len > self.max_text_len {
            return Err(AnnotateError::TooLarge {
                len,
                limit: self.max_text_len,
            });
        }

        annotate(&request.text, &request.model_output, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Correction, UnlocatedReason};

    fn output(corrected: &str, corrections: &[(&str, &str)]) -> ModelOutput {
        ModelOutput {
            corrected: corrected.to_string(),
            corrections: corrections
                .iter()
                .map(|(original, corrected)| Correction::new(*original, *corrected))
                .collect(),
        }
    }

    fn with_radius(context_radius: usize) -> AnnotateOptions {
        AnnotateOptions {
            context_radius,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_typos_scenario() {
        let text = "Ths is a tst";
        let out = output("This is a test", &[("Ths", "This"), ("tst", "test")]);
        let result = annotate(text, &out, &with_radius(4)).unwrap();

        assert_eq!(result.issues.len(), 2);
        let first = &result.issues[0];
        assert_eq!(first.word, "Ths");
        assert_eq!(first.kind, IssueKind::Spelling);
        assert_eq!(first.location, Location::Located { offset: 0, length: 3 });
        assert_eq!(first.context, "Ths is ");
        assert_eq!(first.suggestions, vec!["This".to_string()]);

        let second = &result.issues[1];
        assert_eq!(second.word, "tst");
        assert_eq!(second.location, Location::Located { offset: 9, length: 3 });
        assert_eq!(second.context, "s a tst");
        assert_eq!(second.highlight(), Some(("s a ", "tst", "")));

        assert_eq!(result.corrected_text, "This is a test");
        assert_eq!(result.consistency, Consistency::Consistent);
    }

    #[test]
    fn test_missing_substring_is_unlocated() {
        let out = output("hello world", &[("xyz", "abc")]);
        let result = annotate("hello world", &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(
            issue.location,
            Location::Unlocated {
                reason: UnlocatedReason::NotFound,
                length: 3
            }
        );
        assert_eq!(issue.offset(), None);
        assert_eq!(issue.context, "");
        assert_eq!(result.consistency, Consistency::Unchecked);
    }

    #[test]
    fn test_unlocated_distinct_from_offset_zero() {
        let out = output("The end", &[("Teh", "The"), ("zzz", "z")]);
        let result = annotate("Teh end", &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(result.issues[0].offset(), Some(0));
        assert!(result.issues[0].is_located());
        assert_eq!(result.issues[1].offset(), None);
        assert!(!result.issues[1].is_located());
    }

    #[test]
    fn test_duplicate_typo_first_occurrence_only() {
        // Known limitation of the default strategy: both corrections land on the first "teh".
        let text = "teh cat saw teh dog";
        let out = output("the cat saw the dog", &[("teh", "the"), ("teh", "the")]);
        let result = annotate(text, &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(result.issues[0].offset(), Some(0));
        assert_eq!(result.issues[1].offset(), Some(0));
        assert_eq!(result.consistency, Consistency::Unchecked);
    }

    #[test]
    fn test_duplicate_typo_successive_occurrences() {
        let text = "teh cat saw teh dog";
        let out = output("the cat saw the dog", &[("teh", "the"), ("teh", "the")]);
        let options = AnnotateOptions {
            match_strategy: MatchStrategy::Successive,
            ..Default::default()
        };
        let result = annotate(text, &out, &options).unwrap();

        assert_eq!(result.issues[0].offset(), Some(0));
        assert_eq!(result.issues[1].offset(), Some(12));
        assert_eq!(result.consistency, Consistency::Consistent);
    }

    #[test]
    fn test_successive_reports_exhausted() {
        let out = output("the", &[("teh", "the"), ("teh", "the")]);
        let options = AnnotateOptions {
            match_strategy: MatchStrategy::Successive,
            ..Default::default()
        };
        let result = annotate("teh", &out, &options).unwrap();

        assert!(result.issues[0].is_located());
        assert!(matches!(
            result.issues[1].location,
            Location::Unlocated {
                reason: UnlocatedReason::Exhausted,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_original_is_unlocated() {
        let out = output("abc", &[("", "x")]);
        let result = annotate("abc", &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(
            result.issues[0].location,
            Location::Unlocated {
                reason: UnlocatedReason::EmptyOriginal,
                length: 0
            }
        );
        assert_eq!(result.issues[0].context, "");
    }

    #[test]
    fn test_overlapping_spans_are_not_merged() {
        let out = output("ignored", &[("quick brown", "fast brown"), ("brown fox", "red fox")]);
        let result = annotate("the quick brown fox", &out, &with_radius(0)).unwrap();

        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].location, Location::Located { offset: 4, length: 11 });
        assert_eq!(result.issues[1].location, Location::Located { offset: 10, length: 9 });
        assert_eq!(result.consistency, Consistency::Unchecked);
    }

    #[test]
    fn test_radius_larger_than_text() {
        let out = output("hi", &[("hy", "hi")]);
        let result = annotate("hy", &out, &with_radius(1_000)).unwrap();
        assert_eq!(result.issues[0].context, "hy");

        let result = annotate("", &output("", &[("hy", "hi")]), &with_radius(1_000)).unwrap();
        assert_eq!(result.issues[0].offset(), None);
    }

    #[test]
    fn test_empty_corrections() {
        let out = output("untouched", &[]);
        let result = annotate("untouched", &out, &AnnotateOptions::default()).unwrap();
        assert!(result.issues.is_empty());
        assert_eq!(result.corrected_text, "untouched");
        assert_eq!(result.consistency, Consistency::Consistent);
    }

    #[test]
    fn test_corrected_text_is_not_derived() {
        let out = output("This is a test!", &[("Ths", "This"), ("tst", "test")]);
        let result = annotate("Ths is a tst", &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(result.corrected_text, "This is a test!");
        assert_eq!(
            result.consistency,
            Consistency::Mismatch {
                replayed: "This is a test".to_string()
            }
        );
    }

    #[test]
    fn test_located_spans_and_contexts_match_source() {
        let text = "Recieve the pakage by tomorow, plese.";
        let pairs = [
            ("Recieve", "Receive"),
            ("pakage", "package"),
            ("tomorow", "tomorrow"),
            ("plese", "please"),
            ("nothere", "x"),
        ];
        let out = output("", &pairs);
        let radius = 6;
        let result = annotate(text, &out, &with_radius(radius)).unwrap();

        assert_eq!(result.issues.len(), pairs.len());
        for (issue, (original, _)) in result.issues.iter().zip(pairs.iter()) {
            if let Location::Located { offset, length } = issue.location {
                assert_eq!(&text[offset..offset + length], *original);
                let start = offset.saturating_sub(radius);
                let end = (offset + length + radius).min(text.len());
                assert_eq!(issue.context, &text[start..end]);
            } else {
                assert_eq!(*original, "nothere");
            }
        }
    }

    #[test]
    fn test_annotate_is_deterministic() {
        let out = output("the cat and the hat", &[("teh", "the"), ("hta", "hat"), ("teh", "the")]);
        let text = "teh cat and teh hta";
        let options = AnnotateOptions {
            match_strategy: MatchStrategy::Successive,
            ..Default::default()
        };
        let first = annotate(text, &out, &options).unwrap();
        let second = annotate(text, &out, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_offset_units_on_non_ascii() {
        // "😀" is 1 char, 2 UTF-16 units and 4 bytes; "é" is 1 char, 1 unit, 2 bytes.
        let text = "😀 café tst";
        let out = output("😀 café test", &[("tst", "test")]);

        let at = |offset_unit| {
            let options = AnnotateOptions {
                offset_unit,
                ..Default::default()
            };
            annotate(text, &out, &options).unwrap().issues[0].location
        };

        assert_eq!(at(OffsetUnit::Char), Location::Located { offset: 7, length: 3 });
        assert_eq!(at(OffsetUnit::Utf16), Location::Located { offset: 8, length: 3 });
        assert_eq!(at(OffsetUnit::Byte), Location::Located { offset: 11, length: 3 });
    }

    #[test]
    fn test_drop_policy_omits_unlocated() {
        let out = output("a b", &[("xyz", "q"), ("a", "a")]);
        let options = AnnotateOptions {
            unlocated_policy: UnlocatedPolicy::Drop,
            ..Default::default()
        };
        let result = annotate("a b", &out, &options).unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].word, "a");
        assert_eq!(result.dropped, 1);
        assert_eq!(result.unlocated_count(), 0);
    }

    #[test]
    fn test_keep_policy_retains_unlocated() {
        let out = output("a b", &[("xyz", "q"), ("a", "a")]);
        let result = annotate("a b", &out, &AnnotateOptions::default()).unwrap();

        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.dropped, 0);
        assert_eq!(result.unlocated_count(), 1);
    }

    #[test]
    fn test_fail_policy_reports_indices() {
        let out = output("a b", &[("a", "a"), ("xyz", "q"), ("", "q")]);
        let options = AnnotateOptions {
            unlocated_policy: UnlocatedPolicy::Fail,
            ..Default::default()
        };
        let err = annotate("a b", &out, &options).unwrap_err();
        match err {
            AnnotateError::Unlocated { indices } => assert_eq!(indices, vec![1, 2]),
            other => panic!("unexpected error: {other}"),
        }

        let located_only = output("a b", &[("a", "a")]);
        assert!(annotate("a b", &located_only, &options).is_ok());
    }

    #[test]
    fn test_annotator_rejects_oversized_text() {
        let config = Config {
            max_text_len: 5,
            ..Default::default()
        };
        let annotator = Annotator::new(&config);
        let request = AnnotationRequest::new("too long", output("too long", &[]));

        match annotator.annotate(&request) {
            Err(AnnotateError::TooLarge { len, limit }) => {
                assert_eq!(len, 8);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("first".parse::<MatchStrategy>(), Ok(MatchStrategy::FirstOccurrence));
        assert_eq!("Successive".parse::<MatchStrategy>(), Ok(MatchStrategy::Successive));
        assert!("best".parse::<MatchStrategy>().is_err());
        assert_eq!("utf-16".parse::<OffsetUnit>(), Ok(OffsetUnit::Utf16));
        assert_eq!("drop".parse::<UnlocatedPolicy>(), Ok(UnlocatedPolicy::Drop));
    }
}
