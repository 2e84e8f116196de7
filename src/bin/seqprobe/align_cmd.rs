use std::io::Write;
use std::path::PathBuf;
use anyhow::Result;
use clap::Args;
use seqprobe::pipeline::format_float;
use seqprobe::*;

use crate::args::{open_output, read_first, ModeChoice, ScoringArgs};

/// Options for the `align` subcommand.
#[derive(Debug, Args)]
pub struct AlignCmd {
    /// Target FASTA file (first record used).
    #[arg(long, value_name="FILE")]
    pub asequence: PathBuf,
    /// Query FASTA file (first record used). Defaults to the target itself.
    #[arg(long, value_name="FILE")]
    pub bsequence: Option<PathBuf>,
    /// Global (end-to-end) or local (best substrings).
    #[arg(long, value_enum, default_value_t=ModeChoice::Global)]
    pub mode: ModeChoice,
    #[command(flatten)]
    pub scoring: ScoringArgs,
    /// Output file for a human-readable alignment (stdout if omitted).
    #[arg(long, value_name="FILE")]
    pub outfile: Option<PathBuf>,
}

pub fn run(cmd: AlignCmd) -> Result<()> {
    let a = read_first(&cmd.asequence)?;
    let b = match &cmd.bsequence {
        Some(path) => read_first(path)?,
        None => a.clone(),
    };
    let params = cmd.scoring.params(cmd.mode.into());
    let aln = align(&a.seq, &b.seq, &params)?;

    let mut f = open_output(cmd.outfile.as_deref())?;
    writeln!(f, "# {} alignment", aln.mode)?;
    writeln!(f, "# target: {} (len {})", a.id, a.len())?;
    writeln!(f, "# query: {} (len {})", b.id, b.len())?;
    writeln!(f, "Score: {}", format_float(aln.score))?;
    writeln!(f, "Identity: {:.2}%   Gaps: {:.2}%", aln.identity(), aln.gaps())?;
    writeln!(f, "CIGAR: {}", aln.cigar())?;
    writeln!(f)?;
    write!(f, "{aln}")?;
    f.flush()?;
    Ok(())
}
