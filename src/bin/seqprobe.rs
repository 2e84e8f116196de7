//! Command-line interface for the `seqprobe` crate.
//!
//! Subcommands are implemented in separate files (modules) under `src/bin/seqprobe/`:
//! - `run_cmd.rs` (the full fetch / analyse / align / BLAST report)
//! - `fetch_cmd.rs`
//! - `analyze_cmd.rs`
//! - `align_cmd.rs`
//! - `blast_cmd.rs`
//!
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name="seqprobe", version=env!("CARGO_PKG_VERSION"), about="Fetch, describe, align and BLAST a nucleotide record", disable_help_subcommand=true)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action=ArgAction::Count, global=true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Full report: fetch, analyse, self-align and BLAST one accession.
    Run(run_cmd::RunCmd),
    /// Download one record from NCBI as FASTA.
    Fetch(fetch_cmd::FetchCmd),
    /// Complement, transcription, translation and GC content of a record.
    #[command(visible_alias = "analyse")]
    Analyze(analyze_cmd::AnalyzeCmd),
    /// Global or local pairwise alignment of two FASTA records.
    Align(align_cmd::AlignCmd),
    /// Remote NCBI BLAST search for one FASTA record.
    Blast(blast_cmd::BlastCmd),
}

#[path = "seqprobe/args.rs"] mod args;
#[path = "seqprobe/run_cmd.rs"] mod run_cmd;
#[path = "seqprobe/fetch_cmd.rs"] mod fetch_cmd;
#[path = "seqprobe/analyze_cmd.rs"] mod analyze_cmd;
#[path = "seqprobe/align_cmd.rs"] mod align_cmd;
#[path = "seqprobe/blast_cmd.rs"] mod blast_cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    match cli.command {
        Command::Run(cmd) => run_cmd::run(cmd),
        Command::Fetch(cmd) => fetch_cmd::run(cmd),
        Command::Analyze(cmd) => analyze_cmd::run(cmd),
        Command::Align(cmd) => align_cmd::run(cmd),
        Command::Blast(cmd) => blast_cmd::run(cmd),
    }
}
