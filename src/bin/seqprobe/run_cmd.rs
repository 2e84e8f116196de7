//! CLI subcommand for `seqprobe run` (the full four-stage report).
use std::io::Write;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Args;
use seqprobe::pipeline::{self, PipelineConfig};
use seqprobe::*;

use crate::args::{open_output, write_hits_tsv, BlastArgs, NcbiArgs, ScoringArgs};

/// Options for the `run` subcommand.
#[derive(Debug, Args)]
pub struct RunCmd {
    /// Accession of the nucleotide record.
    #[arg(default_value="NM_001301717")]
    pub accession: String,
    /// Read the record from a local FASTA file instead of NCBI.
    #[arg(long, value_name="FILE")]
    pub fasta: Option<PathBuf>,
    #[command(flatten)]
    pub ncbi: NcbiArgs,
    #[command(flatten)]
    pub scoring: ScoringArgs,
    #[command(flatten)]
    pub blast: BlastArgs,
    /// Stop after the alignments.
    #[arg(long)]
    pub skip_blast: bool,
    /// Write the report to a file instead of stdout.
    #[arg(short, long, value_name="FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: RunCmd) -> Result<()> {
    let source: Box<dyn SequenceSource> = match &cmd.fasta {
        Some(path) => Box::new(FastaFileSource::new(path)),
        None => Box::new(EntrezClient::new(cmd.ncbi.entrez_config())?),
    };
    let searcher = BlastClient::new(cmd.blast.blast_config(&cmd.ncbi.email))?;
    let config = PipelineConfig {
        accession: cmd.accession.clone(),
        aligner: cmd.scoring.params(AlignMode::Global),
        program: cmd.blast.program.clone(),
        database: cmd.blast.blast_db.clone(),
        top_hits: cmd.blast.top,
        skip_search: cmd.skip_blast,
    };

    let mut out = open_output(cmd.output.as_deref())?;
    let report = pipeline::run(&config, source.as_ref(), &searcher, &mut out)
        .with_context(|| format!("report for {}", cmd.accession))?;
    out.flush()?;

    if let Some(path) = &cmd.blast.hits_tsv {
        write_hits_tsv(path, report.reported_matches(config.top_hits))?;
    }
    Ok(())
}
