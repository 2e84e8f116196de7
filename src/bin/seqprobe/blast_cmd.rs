use std::io::Write;
use std::path::PathBuf;
use anyhow::Result;
use clap::Args;
use seqprobe::pipeline::{program_label, write_search};
use seqprobe::*;

use crate::args::{open_output, read_first, write_hits_tsv, BlastArgs};

/// Options for the `blast` subcommand.
#[derive(Debug, Args)]
pub struct BlastCmd {
    /// Query FASTA file (first record used).
    #[arg(long, value_name="FILE")]
    pub sequence: PathBuf,
    /// Contact address sent with the request.
    #[arg(long, env="NCBI_EMAIL", default_value="seqprobe@example.org")]
    pub email: String,
    #[command(flatten)]
    pub blast: BlastArgs,
    /// Output file (stdout if omitted).
    #[arg(long, value_name="FILE")]
    pub outfile: Option<PathBuf>,
}

pub fn run(cmd: BlastCmd) -> Result<()> {
    let rec = read_first(&cmd.sequence)?;
    let client = BlastClient::new(cmd.blast.blast_config(&cmd.email))?;
    let label = program_label(&cmd.blast.program);

    let mut f = open_output(cmd.outfile.as_deref())?;
    writeln!(f, "--- Running {label} on database {} ---", cmd.blast.blast_db)?;
    let outcome: SearchOutcome = client.search(&rec.seq).into();
    write_search(&mut f, &outcome, &label, cmd.blast.top)?;
    f.flush()?;

    match outcome {
        SearchOutcome::Success(matches) => {
            if let Some(path) = &cmd.blast.hits_tsv {
                write_hits_tsv(path, &matches[..matches.len().min(cmd.blast.top)])?;
            }
            Ok(())
        }
        // already reported in the output; the exit status carries the failure
        _ => anyhow::bail!("BLAST search for {} did not complete", rec.id),
    }
}
