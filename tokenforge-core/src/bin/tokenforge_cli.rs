//! TokenForge CLI - token build, legacy pruning, contract checks
//!
//! Summaries go to stdout, logs and diagnostics to stderr.
//! Exit 0 on success, 1 on any compiler fault or FAIL.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tokenforge_core::{
    docs::{clean_docs, generate_docs},
    scanner::{check_router, scan_fallbacks, RouterOutcome},
    CheckContext, ContractChecker, LegacyPruner, ProjectLayout, PrunePolicy, TokenPipeline,
};

#[derive(Parser)]
#[command(name = "tokenforge-cli")]
#[command(about = "TokenForge CLI - Design Token Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Layout config, relative to the root (default: tokenforge.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the token document into the generated stylesheets
    Build,

    /// Compare the legacy stylesheet against generated output
    Prune {
        /// Write a pruned copy of the legacy file
        #[arg(long)]
        write: bool,

        /// Overwrite the legacy file instead of writing a copy
        #[arg(long, requires = "write")]
        in_place: bool,
    },

    /// Run the contract battery and write the report
    Check,

    /// Fail if any var(--token, fallback) lookup exists
    ScanFallbacks,

    /// Fail if the router lacks its required markers
    CheckRouter,

    /// Generate the router map and token snapshot docs
    Docs,

    /// Remove the generated docs directory
    CleanDocs,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ExitCode {
    eprintln!("error: {context}: {err}");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.as_path();

    let layout = match ProjectLayout::load(root, cli.config.as_deref()) {
        Ok(l) => l,
        Err(e) => return fail("failed to load layout", e),
    };

    match cli.command {
        Commands::Build => match TokenPipeline::new(root, layout).build() {
            Ok(summary) => {
                print_json(&summary);
                ExitCode::SUCCESS
            }
            Err(e) => fail("token build failed", e),
        },

        Commands::Prune { write, in_place } => {
            let policy = PrunePolicy::from_flags(write, in_place);
            match LegacyPruner::new(root, &layout).run(policy) {
                Ok(report) => {
                    print!("{}", report.render());
                    ExitCode::SUCCESS
                }
                Err(e) => fail("prune failed", e),
            }
        }

        Commands::Check => run_check(root, &layout),

        Commands::ScanFallbacks => {
            let hits = scan_fallbacks(root, &layout.fallback_scan);
            print_json(&serde_json::json!({
                "pass": hits.is_empty(),
                "files": hits,
            }));
            if hits.is_empty() {
                ExitCode::SUCCESS
            } else {
                eprintln!("FAIL: CSS var() fallbacks detected. Remove fallbacks and resolve token sources.");
                ExitCode::FAILURE
            }
        }

        Commands::CheckRouter => {
            let outcome = check_router(root, &layout.collaborators.executor, &layout.router);
            print_json(&outcome);
            match outcome {
                RouterOutcome::Holds => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            }
        }

        Commands::Docs => match generate_docs(root, &layout) {
            Ok(paths) => {
                print_json(&paths);
                ExitCode::SUCCESS
            }
            Err(e) => fail("docs generation failed", e),
        },

        Commands::CleanDocs => match clean_docs(root, &layout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail("clean failed", e),
        },
    }
}

fn run_check(root: &Path, layout: &ProjectLayout) -> ExitCode {
    let ctx = CheckContext { root, layout };
    let report = ContractChecker::new().run(&ctx);
    let path = match report.write(root, &layout.report_dir) {
        Ok(p) => p,
        Err(e) => return fail("failed to write report", e),
    };
    print_json(&serde_json::json!({
        "report": path,
        "summary": report.summary(),
        "results": report.results,
    }));
    if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
