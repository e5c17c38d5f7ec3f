//! # CLI Module
//!
//! Command-line interface for the dataset audit.
//!
//! ## Usage
//! ```bash
//! # Audit a dataset with the default corn classes
//! dataset-audit audit ./corn_dataset
//!
//! # Stricter near-duplicate threshold
//! dataset-audit audit ./corn_dataset --threshold 3
//!
//! # Settings from a file, JSON summary on stdout
//! dataset-audit audit ./corn_dataset --config audit.toml --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use dataset_evidence::config::AuditConfig;
use dataset_evidence::core::pipeline::{AuditReport, Auditor, CancellationToken};
use dataset_evidence::error::Result;
use dataset_evidence::events::{AuditEvent, Event, EventChannel, HashEvent, HashKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;
use tracing::warn;

/// Dataset Evidence - leakage and duplicate audit for train/val/test splits
#[derive(Parser, Debug)]
#[command(name = "dataset-audit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every audit step and write the reports
    Audit(AuditArgs),
}

#[derive(clap::Args, Debug)]
struct AuditArgs {
    /// Dataset root containing images/ and labels/
    root: PathBuf,

    /// TOML file with audit settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum Hamming distance for a near-duplicate pair (0-64)
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Signature bits used as the bucket key
    #[arg(long)]
    bucket_bits: Option<u32>,

    /// Thumbnail side for the average hash (1-8)
    #[arg(long)]
    thumbnail_side: Option<u32>,

    /// Class names in class-id order, comma separated
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    /// Augmentation prefix, in stage order (repeatable)
    #[arg(long = "aug-prefix")]
    aug_prefixes: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Hash files on a single thread
    #[arg(long)]
    no_parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit(args) => run_audit(args),
    }
}

/// Merge defaults, the optional TOML file and the flags
fn build_config(args: &AuditArgs) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_toml_file(path)?,
        None => AuditConfig::default(),
    };

    config.dataset_root = args.root.clone();
    if let Some(threshold) = args.threshold {
        config.hamming_threshold = threshold;
    }
    if let Some(bits) = args.bucket_bits {
        config.bucket_prefix_bits = bits;
    }
    if let Some(side) = args.thumbnail_side {
        config.thumbnail_side = side;
    }
    if let Some(classes) = &args.classes {
        config.class_names = classes.clone();
    }
    if !args.aug_prefixes.is_empty() {
        config.augmentation_prefixes = args.aug_prefixes.clone();
    }
    if args.no_parallel {
        config.parallel = false;
    }

    Ok(config)
}

fn run_audit(args: AuditArgs) -> Result<()> {
    dataset_evidence::init_tracing(args.verbose);

    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("== Evidence & Leakcheck ==").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
    }

    let config = build_config(&args)?;
    let token = CancellationToken::new();
    let auditor = Auditor::builder(config).cancellation(token.clone()).build()?;

    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let root = auditor.config().dataset_root.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Audit(AuditEvent::StepStarted { step }) => {
                    pb.println(format!("{}", style(step).bold()));
                }
                Event::Audit(AuditEvent::StepCompleted {
                    findings, report, ..
                }) => {
                    let shown = report.strip_prefix(&root).unwrap_or(report.as_path());
                    pb.println(format!(
                        "  -> {} ({})",
                        shown.display(),
                        style(findings).cyan()
                    ));
                }
                Event::Hash(HashEvent::Started { kind, total_files }) => {
                    pb.reset();
                    pb.set_length(total_files as u64);
                    pb.set_message(match kind {
                        HashKind::Content => "sha1",
                        HashKind::Perceptual => "ahash",
                    });
                }
                Event::Hash(HashEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Hash(HashEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                Event::Audit(AuditEvent::Cancelled) => {
                    pb.abandon_with_message("cancelled");
                }
                _ => {}
            }
        }
    });

    // Run the audit
    let result = auditor.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;

    match args.output {
        OutputFormat::Pretty => print_pretty_results(&term, &report),
        OutputFormat::Json => print_json_results(&report),
    }

    Ok(())
}

fn status(passed: bool) -> String {
    if passed {
        style("PASS").green().bold().to_string()
    } else {
        style("ALERT").red().bold().to_string()
    }
}

fn print_pretty_results(term: &Term, report: &AuditReport) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{} Audit complete in {:.1}s",
        style("✓").green().bold(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line("").ok();

    for listing in &report.lists {
        term.write_line(&format!(
            "  {:<6} {} labeled images",
            listing.split,
            style(listing.images).cyan()
        ))
        .ok();
    }
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} leakage: {} augmented names in val/test",
        status(report.leakage.passed()),
        report.leakage.total_offenders()
    ))
    .ok();
    term.write_line(&format!(
        "  {} exact duplicates: {} cross-split groups",
        status(report.exact_duplicates.is_empty()),
        report.exact_duplicates.len()
    ))
    .ok();

    let low_confidence = report
        .near_duplicates
        .iter()
        .filter(|p| p.low_confidence)
        .count();
    term.write_line(&format!(
        "  {} near duplicates: {} cross-split pairs{}",
        status(report.near_duplicates.is_empty()),
        report.near_duplicates.len(),
        if low_confidence > 0 {
            format!(" ({} low confidence)", low_confidence)
        } else {
            String::new()
        }
    ))
    .ok();
    term.write_line(&format!(
        "  {} label ids: {} out of range",
        status(report.invalid_class_ids.is_empty()),
        report.invalid_class_ids.len()
    ))
    .ok();

    term.write_line(&format!("  {}", style(&report.index_stats).dim()))
        .ok();

    if report.fallback_signatures > 0 {
        term.write_line(&format!(
            "  {} images could not be decoded and were matched by content digest",
            style(report.fallback_signatures).yellow()
        ))
        .ok();
    }

    if !report.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style(format!("{} files skipped:", report.errors.len())).yellow()
        ))
        .ok();
        for error in &report.errors {
            term.write_line(&format!("    {}", style(error).dim())).ok();
        }
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("Reports only. No dataset files were changed.").dim()
    ))
    .ok();
}

fn print_json_results(report: &AuditReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!(error = %e, "could not serialize the audit report"),
    }
}
