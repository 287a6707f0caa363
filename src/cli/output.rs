use crate::annotate::Consistency;
use crate::{Envelope, Issue, Location, UnlocatedReason};
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    #[serde(flatten)]
    envelope: &'a Envelope,
}

pub fn print_annotation(
    file_path: &Path,
    envelope: &Envelope,
    colored_output: bool,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print_text_annotation(file_path, envelope, colored_output);
            Ok(())
        }
        OutputFormat::Json => print_json_annotation(file_path, envelope),
    }
}

fn print_text_annotation(file_path: &Path, envelope: &Envelope, colored_output: bool) {
    let file_name = file_path.display().to_string();

    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for issue in &envelope.issues {
        print_issue(issue, colored_output);
    }

    if let Consistency::Mismatch { replayed } = &envelope.consistency {
        let note = "corrections do not reproduce the corrected text";
        if colored_output {
            println!("  {} {}", "!".yellow().bold(), note.yellow());
            println!("    {} {}", "model:".dimmed(), envelope.corrected_text);
            println!("    {} {}", "replayed:".dimmed(), replayed);
        } else {
            println!("  ! {}", note);
            println!("    model: {}", envelope.corrected_text);
            println!("    replayed: {}", replayed);
        }
    }
}

fn print_issue(issue: &Issue, colored_output: bool) {
    let suggestions = issue.suggestions.join(", ");

    match issue.location {
        Location::Located { offset, length } => {
            let span = format!("{}+{}", offset, length);
            if colored_output {
                println!(
                    "  {} {} {}",
                    span.blue().bold(),
                    issue.word.red().bold(),
                    format_context(issue, colored_output)
                );
                println!("    {} {}", "→".dimmed(), suggestions.green());
            } else {
                println!("  {} {} {}", span, issue.word, issue.context);
                println!("    → {}", suggestions);
            }
        }
        Location::Unlocated { reason, .. } => {
            let why = describe(reason);
            if colored_output {
                println!(
                    "  {} {} {}",
                    "?".yellow().bold(),
                    issue.word.red().bold(),
                    format!("({})", why).dimmed()
                );
                println!("    {} {}", "→".dimmed(), suggestions.green());
            } else {
                println!("  ? {} ({})", issue.word, why);
                println!("    → {}", suggestions);
            }
        }
    }
}

fn describe(reason: UnlocatedReason) -> &'static str {
    match reason {
        UnlocatedReason::NotFound => "not found in text",
        UnlocatedReason::EmptyOriginal => "empty original",
        UnlocatedReason::Exhausted => "no occurrence left",
    }
}

fn print_json_annotation(file_path: &Path, envelope: &Envelope) -> Result<()> {
    let report = JsonReport {
        file: file_path.display().to_string(),
        envelope,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn format_context(issue: &Issue, colored: bool) -> String {
    match issue.highlight() {
        Some((before, word, after)) if colored => {
            format!("{}{}{}", before, word.red().bold(), after)
        }
        _ => issue.context.clone(),
    }
}

pub fn print_annotate_summary(
    total_issues: usize,
    unlocated: usize,
    files: &[impl AsRef<Path>],
    colored: bool,
) {
    println!();
    let file_word = if files.len() == 1 { "file" } else { "files" };

    if total_issues == 0 {
        if colored {
            println!("{}", "✓ No corrections to annotate!".green().bold());
        } else {
            println!("✓ No corrections to annotate!");
        }
        return;
    }

    let issue_word = if total_issues == 1 { "issue" } else { "issues" };
    if colored {
        println!(
            "{} {} {} annotated in {} {}",
            "✗".red().bold(),
            total_issues.to_string().red().bold(),
            issue_word,
            files.len(),
            file_word
        );
        if unlocated > 0 {
            println!(
                "  {} {} could not be located",
                unlocated.to_string().yellow().bold(),
                if unlocated == 1 { "correction" } else { "corrections" }
            );
        }
    } else {
        println!(
            "✗ {} {} annotated in {} {}",
            total_issues,
            issue_word,
            files.len(),
            file_word
        );
        if unlocated > 0 {
            println!(
                "  {} {} could not be located",
                unlocated,
                if unlocated == 1 { "correction" } else { "corrections" }
            );
        }
    }
}
