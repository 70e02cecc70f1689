//! plut CLI - generate and inspect precomputed lookup tables
//!
//! `plut generate` asks an external solver for the play-out of every answer
//! word and writes the resulting table; `plut inspect` dumps a table file.

mod error;

use clap::{Parser, Subcommand};
use error::{exit_with_error, CliError};
use plut_engine::{SubprocessOracle, Word};
use plut_tree::{dump, generate, ConflictPolicy, GenerateConfig, LookupView};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "plut", about = "Precomputed word-guess lookup tables", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log progress to stderr (honours RUST_LOG)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a lookup table by replaying the solver on every answer
    Generate {
        /// Starting word
        #[arg(long, default_value = "roate")]
        start: Word,

        /// Lookup depth
        #[arg(long, default_value_t = 3)]
        depth: u32,

        /// Path to the solver binary
        #[arg(long, default_value = "build/solver_cpp")]
        solver: PathBuf,

        /// Answer list, one word per line
        #[arg(long, default_value = "official_answers.txt")]
        words: PathBuf,

        /// Output file (default: lookup_<start>.bin)
        #[arg(long)]
        output: Option<PathBuf>,

        /// On conflicting guesses keep the first one instead of failing
        #[arg(long)]
        keep_first: bool,

        /// Parallel solver invocations (default: one per core)
        #[arg(long)]
        jobs: Option<usize>,

        /// Extra argument for the solver, repeatable
        #[arg(long = "oracle-arg", allow_hyphen_values = true)]
        oracle_args: Vec<String>,
    },

    /// Print a lookup table as an indented tree
    Inspect {
        /// Lookup table file
        path: PathBuf,

        /// Fail unless the table was built for this starting word
        #[arg(long)]
        expect_start: Option<Word>,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            start,
            depth,
            solver,
            words,
            output,
            keep_first,
            jobs,
            oracle_args,
        } => {
            let targets = load_words(&words)?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("lookup_{}.bin", start)));
            info!(
                words = %words.display(),
                targets = targets.len(),
                solver = %solver.display(),
                output = %output.display(),
                "starting generation"
            );

            let config = GenerateConfig {
                start,
                depth,
                policy: if keep_first {
                    ConflictPolicy::KeepFirst
                } else {
                    ConflictPolicy::Fail
                },
                jobs,
            };
            let oracle = SubprocessOracle::new(solver).with_args(oracle_args);
            let table = generate(&config, &oracle, &targets, &output)?;

            println!(
                "Wrote lookup table '{}' ({} bytes, nodes={}, entries={}, traces={})",
                output.display(),
                table.bytes.len(),
                table.layout.nodes,
                table.layout.entries,
                table.build.traces_used
            );
            Ok(())
        }
        Commands::Inspect { path, expect_start } => {
            let bytes = fs::read(&path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), bytes = bytes.len(), "inspecting table");
            if let Some(word) = expect_start {
                LookupView::parse(&bytes)?.expect_start(word)?;
            }
            print!("{}", dump(&bytes)?);
            Ok(())
        }
    }
}

/// One word per line; blank lines are ignored and duplicates collapse.
fn load_words(path: &Path) -> Result<Vec<Word>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut words = BTreeSet::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let word = Word::parse(line).map_err(|source| CliError::WordList {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        words.insert(word);
    }
    Ok(words.into_iter().collect())
}
