use annotext::annotate::{MatchStrategy, OffsetUnit, UnlocatedPolicy};
use annotext::cli::output::{self, OutputFormat};
use annotext::config::Overrides;
use annotext::{text, AnnotateError, AnnotationRequest, Annotator, Config, Envelope};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "annotext")]
#[command(version, about = "Anchor model corrections onto the original text", long_about = None)]
struct Cli {
    /// Annotation request files ({"text": ..., "model_output": {...}})
    #[arg(value_name = "REQUESTS")]
    requests: Vec<PathBuf>,

    /// Chars of context kept on each side of an issue
    #[arg(short, long)]
    radius: Option<usize>,

    /// How repeated corrections are anchored (first, successive)
    #[arg(long)]
    strategy: Option<MatchStrategy>,

    /// What to do with corrections that cannot be located (keep, drop, fail)
    #[arg(long)]
    unlocated: Option<UnlocatedPolicy>,

    /// Unit for offsets and lengths (char, utf16, byte)
    #[arg(long)]
    unit: Option<OffsetUnit>,

    /// Model name reported in the response
    #[arg(long)]
    model: Option<String>,

    /// Language reported in the response (e.g., en_US, en_GB)
    #[arg(short, long)]
    language: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if issues are found
    #[arg(long)]
    no_fail: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Redact terms from a text file
    Redact {
        /// Text file to redact
        file: PathBuf,
        /// Term to redact (case-insensitive, repeatable)
        #[arg(short, long = "term", required = true)]
        terms: Vec<String>,
        /// Replacement marker
        #[arg(long)]
        marker: Option<String>,
    },
    /// Print the first sentence of a text file
    Summarize {
        /// Text file to summarize
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "annotext", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(Overrides {
        model: cli.model.clone(),
        language: cli.language.clone(),
        context_radius: cli.radius,
        match_strategy: cli.strategy,
        unlocated_policy: cli.unlocated,
        offset_unit: cli.unit,
    })?;

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.requests.is_empty() {
        anyhow::bail!("No request files specified. Use --help for usage information.");
    }

    let annotator = Annotator::new(&config);
    let colored = !cli.no_color;
    info!(files = cli.requests.len(), options = ?annotator.options(), "annotating");

    // Requests are independent; annotate in parallel, report in argument order.
    let outcomes: Vec<_> = cli
        .requests
        .par_iter()
        .map(|path| annotate_file(&annotator, &config, path))
        .collect();

    let mut total_issues = 0;
    let mut total_unlocated = 0;
    let mut failed = 0;

    for (path, outcome) in cli.requests.iter().zip(outcomes) {
        match outcome {
            Ok(envelope) => {
                total_issues += envelope.issue_count;
                total_unlocated += envelope.issues.iter().filter(|i| !i.is_located()).count();
                output::print_annotation(path, &envelope, colored, &cli.format)?;
            }
            Err(err) => {
                failed += 1;
                eprintln!("Error: {}: {}", path.display(), err);
            }
        }
    }

    if let OutputFormat::Text = cli.format {
        output::print_annotate_summary(total_issues, total_unlocated, &cli.requests, colored);
    }

    info!(total_issues, total_unlocated, failed, "done");

    // Exit with appropriate code
    if failed > 0 {
        std::process::exit(2);
    }
    if total_issues > 0 && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn annotate_file(annotator: &Annotator, config: &Config, path: &Path) -> Result<Envelope, AnnotateError> {
    let request = AnnotationRequest::from_path(path)?;
    let result = annotator.annotate(&request)?;
    Ok(Envelope::new(result, &config.model, &config.language, Utc::now()))
}

fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Redact { file, terms, marker } => {
            let content = read_text(&file)?;
            let marker = marker.as_deref().unwrap_or(&config.redaction_marker);
            let redacted = text::redact(&content, &terms, marker)
                .with_context(|| format!("Failed to redact {}", file.display()))?;
            print!("{}", redacted);
        }
        Commands::Summarize { file } => {
            let content = read_text(&file)?;
            println!("{}", text::summarize(&content));
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
