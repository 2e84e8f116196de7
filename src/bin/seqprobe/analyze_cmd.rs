use std::io::Write;
use std::path::PathBuf;
use anyhow::Result;
use clap::Args;
use seqprobe::pipeline::format_float;
use seqprobe::*;

use crate::args::{open_output, read_first, NcbiArgs};

/// Options for the `analyze` subcommand.
#[derive(Debug, Args)]
pub struct AnalyzeCmd {
    /// Accession to fetch (ignored with --fasta).
    #[arg(required_unless_present="fasta")]
    pub accession: Option<String>,
    /// FASTA file (first record used).
    #[arg(long, value_name="FILE")]
    pub fasta: Option<PathBuf>,
    #[command(flatten)]
    pub ncbi: NcbiArgs,
    /// Translate through stop codons, printing them as `*`.
    #[arg(long)]
    pub read_through: bool,
    /// Output file (stdout if omitted).
    #[arg(long, value_name="FILE")]
    pub outfile: Option<PathBuf>,
}

pub fn run(cmd: AnalyzeCmd) -> Result<()> {
    let rec = match (&cmd.fasta, &cmd.accession) {
        (Some(path), _) => read_first(path)?,
        (None, Some(acc)) => EntrezClient::new(cmd.ncbi.entrez_config())?.fetch_fasta(acc)?,
        (None, None) => anyhow::bail!("give an accession or --fasta"),
    };
    let summary = SequenceSummary::from_sequence(&rec.seq);
    let protein = if cmd.read_through { translate(&summary.transcript, false) } else { summary.protein.clone() };

    let mut f = open_output(cmd.outfile.as_deref())?;
    writeln!(f, "# {} (len {})", rec.description, rec.len())?;
    writeln!(f, "Complement: {}", summary.complement)?;
    writeln!(f, "Reverse Complement: {}", summary.reverse_complement)?;
    writeln!(f, "Transcription (DNA → RNA): {}", summary.transcript)?;
    writeln!(f, "Translation (RNA → Protein): {}", protein)?;
    writeln!(f, "GC Content: {} %", format_float(summary.gc_percent))?;
    f.flush()?;
    Ok(())
}
