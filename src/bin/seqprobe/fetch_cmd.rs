use std::io::Write;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Args;
use seqprobe::*;

use crate::args::{open_output, NcbiArgs};

/// Options for the `fetch` subcommand.
#[derive(Debug, Args)]
pub struct FetchCmd {
    /// Accession to download.
    pub accession: String,
    #[command(flatten)]
    pub ncbi: NcbiArgs,
    /// efetch return type (`fasta`, `gb`, ...). FASTA replies are checked to hold one record.
    #[arg(long, default_value="fasta")]
    pub rettype: String,
    /// Output file (stdout if omitted).
    #[arg(long, value_name="FILE")]
    pub outfile: Option<PathBuf>,
}

pub fn run(cmd: FetchCmd) -> Result<()> {
    let client = EntrezClient::new(cmd.ncbi.entrez_config())?;
    let body = client
        .efetch(&cmd.ncbi.db, &cmd.accession, &cmd.rettype, "text")
        .with_context(|| format!("efetch {}", cmd.accession))?;
    if cmd.rettype == "fasta" {
        let rec = read_single_fasta(&body).with_context(|| format!("reply for {}", cmd.accession))?;
        log::info!("{}: {} bp", rec.id, rec.len());
    }
    let mut out = open_output(cmd.outfile.as_deref())?;
    out.write_all(body.as_bytes())?;
    out.flush()?;
    Ok(())
}
