mod config;
mod diagnostics;
mod error;
mod indexer;
mod matcher;
#[cfg(test)]
mod mock;
mod operations;
mod rewriter;
mod store;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::indexer::UsageReport;
use crate::matcher::Selector;
use crate::operations::CleanReport;
use crate::store::{DocumentFilter, DryRunStore, FsStore};
use crate::types::{DocumentId, RegisteredNames};

/// Exit code when `usage --strict` finds unregistered shortcodes.
const EXIT_UNUSED_FOUND: u8 = 1;
/// Exit code when one or more document writes failed.
const EXIT_WRITE_FAILED: u8 = 2;
/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 3;

#[derive(Parser)]
#[command(name = "shortclean", version, about = "Find and strip unregistered shortcodes")]
struct Cli {
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
    /// Treat NAME as a registered shortcode (repeatable)
    #[arg(long = "register", value_name = "NAME", global = true)]
    register: Vec<String>,
    /// Corpus root directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Log progress at info level (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Strip unregistered shortcodes from one document
    Clean {
        /// Document id (path relative to the root)
        id: String,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Strip unregistered shortcodes from every matching document
    CleanAll {
        /// Document selection.
        #[command(flatten)]
        filter: FilterArgs,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Strip every occurrence of one shortcode, registered or not
    Remove {
        /// Shortcode name
        name: String,
        /// Document selection.
        #[command(flatten)]
        filter: FilterArgs,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Clean text from stdin and print the result
    Strip {
        /// Strip only this shortcode instead of every unregistered one
        #[arg(long)]
        name: Option<String>,
    },
    /// List used and unused shortcodes across the corpus
    Usage {
        /// Document selection.
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
        /// Exit 1 when unused shortcodes exist
        #[arg(long)]
        strict: bool,
    },
}

/// Document selection shared by collection commands.
#[derive(Args)]
struct FilterArgs {
    /// Only documents with this status (repeatable)
    #[arg(long = "status", value_name = "STATUS")]
    statuses: Vec<String>,
    /// Only documents of this type (repeatable; `all` for any)
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,
}

impl FilterArgs {
    /// Convert to a store filter.
    fn into_filter(self) -> DocumentFilter {
        let types = if self.types.iter().any(|t| return t == "all") { Vec::new() } else { self.types };
        return DocumentFilter { statuses: self.statuses, types };
    }
}

/// Parse arguments, run one command, and map the outcome to an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    return match run(cli) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        },
    };
}

/// Install the tracing subscriber on stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Dispatch one command.
///
/// # Errors
///
/// Returns errors from config loading, the document store, or stdin.
fn run(cli: Cli) -> Result<ExitCode, error::Error> {
    let config = config::Config::load(&cli.root)?;
    let registered = config.registered_names(&cli.register);
    let store = FsStore::new(cli.root, config);

    match cli.command {
        Commands::Clean { id, dry_run } => {
            warn_if_registry_empty(&registered);
            let id = DocumentId(id);
            let changed = if dry_run {
                operations::clean_one(&DryRunStore::new(&store), &id, &registered)?
            } else {
                operations::clean_one(&store, &id, &registered)?
            };
            if changed {
                eprintln!("{} {id}", if dry_run { "Would clean" } else { "Cleaned" });
            } else {
                eprintln!("Nothing to clean in {id}");
            }
            return Ok(ExitCode::SUCCESS);
        },
        Commands::CleanAll { filter, dry_run } => {
            warn_if_registry_empty(&registered);
            let filter = filter.into_filter();
            let report = if dry_run {
                operations::clean_all_unregistered(&DryRunStore::new(&store), &registered, &filter)?
            } else {
                operations::clean_all_unregistered(&store, &registered, &filter)?
            };
            return Ok(print_clean_report(&report, dry_run));
        },
        Commands::Remove { name, filter, dry_run } => {
            let filter = filter.into_filter();
            let report = if dry_run {
                operations::clean_named(&DryRunStore::new(&store), &name, &filter)?
            } else {
                operations::clean_named(&store, &name, &filter)?
            };
            if report.cleaned.is_empty() && report.failed.is_empty() {
                eprintln!("Shortcode `{}` not found in any document.", name.trim());
                return Ok(ExitCode::SUCCESS);
            }
            return Ok(print_clean_report(&report, dry_run));
        },
        Commands::Strip { name } => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let output = match name.as_deref().map(str::trim) {
                Some("") => return Err(error::Error::MissingDirectiveName),
                Some(name) => rewriter::clean(&input, &Selector::Named(name)),
                None => {
                    warn_if_registry_empty(&registered);
                    rewriter::clean(&input, &Selector::Unregistered(&registered))
                },
            };
            println!("{output}");
            return Ok(ExitCode::SUCCESS);
        },
        Commands::Usage { filter, json, strict } => {
            let report = operations::fetch_usage(&store, &registered, &filter.into_filter())?;
            if json {
                // serde_json::to_string_pretty won't fail on this structure.
                println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            } else {
                print_usage_report(&report);
            }
            if strict && !report.unused.is_empty() {
                return Ok(ExitCode::from(EXIT_UNUSED_FOUND));
            }
            return Ok(ExitCode::SUCCESS);
        },
    }
}

/// Print a summary of a collection clean. Returns the exit code it implies.
fn print_clean_report(report: &CleanReport, dry_run: bool) -> ExitCode {
    let verb = if dry_run { "Would clean" } else { "Cleaned" };
    for id in &report.cleaned {
        eprintln!("{verb}  {id}");
    }
    for (id, reason) in &report.failed {
        eprintln!("FAILED  {id} ({reason})");
    }

    let cleaned = report.cleaned.len();
    let scanned = report.scanned;
    eprintln!();
    eprintln!("{verb} {cleaned} of {scanned} documents");

    if report.failed.is_empty() {
        return ExitCode::SUCCESS;
    }
    let failed = report.failed.len();
    eprintln!("{failed} documents could not be written");
    return ExitCode::from(EXIT_WRITE_FAILED);
}

/// Print the usage report as markdown.
fn print_usage_report(report: &UsageReport) {
    println!("## Unused shortcodes ({})", report.unused.len());
    println!();
    for unused in &report.unused {
        println!("- `{}` ({} occurrences)", unused.name, unused.locations.len());
        for location in &unused.locations {
            println!(
                "  - {} [{}]  edit: {}  view: {}",
                location.title, location.doc_type, location.edit_link, location.view_link
            );
        }
    }

    println!();
    println!("## Used shortcodes ({})", report.used.len());
    println!();
    for name in &report.used {
        println!("- `{name}`");
    }
    return;
}

/// With nothing registered every shortcode counts as unregistered.
fn warn_if_registry_empty(registered: &RegisteredNames) {
    if registered.is_empty() {
        tracing::warn!("no shortcodes registered; every shortcode will be treated as unregistered");
    } else {
        tracing::info!(registered = registered.len(), "registry loaded");
    }
    return;
}
