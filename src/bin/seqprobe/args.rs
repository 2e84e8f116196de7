//! Argument groups shared by several subcommands.
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use seqprobe::*;

/// NCBI identity and efetch options.
#[derive(Debug, Args)]
pub struct NcbiArgs {
    /// Contact address sent with every NCBI request (usage policy).
    #[arg(long, env="NCBI_EMAIL", default_value="seqprobe@example.org")]
    pub email: String,
    /// E-utilities API key (raises the request rate limit).
    #[arg(long, env="NCBI_API_KEY", hide_env_values=true)]
    pub api_key: Option<String>,
    /// Entrez database for efetch.
    #[arg(long, default_value="nucleotide")]
    pub db: String,
}

impl NcbiArgs {
    pub fn entrez_config(&self) -> EntrezConfig {
        EntrezConfig {
            email: self.email.clone(),
            api_key: self.api_key.clone(),
            db: self.db.clone(),
            ..Default::default()
        }
    }
}

/// Alignment scoring (defaults: match 1, mismatch 0, free gaps).
#[derive(Debug, Args)]
pub struct ScoringArgs {
    /// Score for identical symbols.
    #[arg(long, default_value_t=1.0)]
    pub match_score: f64,
    /// Score for differing symbols.
    #[arg(long, default_value_t=0.0, allow_hyphen_values=true)]
    pub mismatch_score: f64,
    /// Gap open penalty (>= 0, subtracted).
    #[arg(long, default_value_t=0.0)]
    pub gap_open: f64,
    /// Gap extension penalty (>= 0, subtracted).
    #[arg(long, default_value_t=0.0)]
    pub gap_extend: f64,
}

impl ScoringArgs {
    pub fn params(&self, mode: AlignMode) -> AlignerParams {
        AlignerParams {
            mode,
            match_score: self.match_score,
            mismatch_score: self.mismatch_score,
            gap_open: self.gap_open,
            gap_extend: self.gap_extend,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeChoice { Global, Local }

impl From<ModeChoice> for AlignMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Global => AlignMode::Global,
            ModeChoice::Local => AlignMode::Local,
        }
    }
}

/// Remote BLAST options.
#[derive(Debug, Args)]
pub struct BlastArgs {
    /// BLAST program.
    #[arg(long, default_value="blastn")]
    pub program: String,
    /// BLAST database.
    #[arg(long="blast-db", default_value="nt")]
    pub blast_db: String,
    /// Hits printed in the report.
    #[arg(long, default_value_t=3)]
    pub top: usize,
    /// Hits requested from the service.
    #[arg(long, default_value_t=50)]
    pub hitlist_size: usize,
    /// E-value threshold.
    #[arg(long, default_value_t=10.0)]
    pub expect: f64,
    /// Use megablast for blastn.
    #[arg(long)]
    pub megablast: bool,
    /// Seconds between status polls (NCBI asks for no more than one a minute).
    #[arg(long, default_value_t=60)]
    pub poll_interval: u64,
    /// Optional TSV file with one row per reported HSP.
    #[arg(long, value_name="FILE")]
    pub hits_tsv: Option<PathBuf>,
}

impl BlastArgs {
    pub fn blast_config(&self, email: &str) -> BlastConfig {
        BlastConfig {
            program: self.program.clone(),
            database: self.blast_db.clone(),
            hitlist_size: self.hitlist_size,
            expect: self.expect,
            megablast: self.megablast,
            poll_interval: Duration::from_secs(self.poll_interval),
            email: email.to_string(),
            ..Default::default()
        }
    }
}

/// Report destination: a file if given, stdout otherwise.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(io::BufWriter::new(File::create(p).with_context(|| format!("create {}", p.display()))?)),
        None => Box::new(io::stdout().lock()),
    })
}

/// Read the first record of a FASTA file.
pub fn read_first(path: &Path) -> Result<SequenceRecord> {
    let text = std::fs::read_to_string(path).with_context(|| format!("open FASTA: {}", path.display()))?;
    parse_fasta(&text).into_iter().next().ok_or_else(|| anyhow::anyhow!("no FASTA records in {}", path.display()))
}

pub fn write_hits_tsv(path: &Path, matches: &[SimilarityMatch]) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_hsp_table(matches, f)?;
    Ok(())
}
