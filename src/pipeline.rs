//! The four-stage run: fetch, analyse, self-align, search.
//!
//! Every stage writes its section of the report to `out` before the next one
//! starts. Errors in the first three stages are returned; the search stage
//! reports its own failures in the text and never fails the run.
use std::io::Write;

use log::{info, warn};

use crate::align::{align, AlignMode, AlignerParams, PairwiseAlignment};
use crate::analysis::SequenceSummary;
use crate::blast::{search_record, SearchOutcome, SimilarityMatch, SimilaritySearch};
use crate::common::{SeqprobeError, SequenceRecord, SequenceSource};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub accession: String,
    /// Scoring for both alignments; the mode field is ignored.
    pub aligner: AlignerParams,
    /// Program and database named in the search header.
    pub program: String,
    pub database: String,
    /// Number of hits printed.
    pub top_hits: usize,
    pub skip_search: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            accession: "NM_001301717".to_string(),
            aligner: AlignerParams::default(),
            program: "blastn".to_string(),
            database: "nt".to_string(),
            top_hits: 3,
            skip_search: false,
        }
    }
}

/// What one run produced, for callers that want more than the text.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    pub record: SequenceRecord,
    pub summary: SequenceSummary,
    pub global: PairwiseAlignment,
    pub local: PairwiseAlignment,
    /// `None` when the search stage was skipped.
    pub search: Option<SearchOutcome>,
}

impl PipelineRun {
    /// The hits that made it into the report.
    pub fn reported_matches(&self, top: usize) -> &[SimilarityMatch] {
        match &self.search {
            Some(SearchOutcome::Success(m)) => &m[..m.len().min(top)],
            _ => &[],
        }
    }
}

pub fn run<W: Write + ?Sized>(
    config: &PipelineConfig,
    source: &dyn SequenceSource,
    searcher: &dyn SimilaritySearch,
    out: &mut W,
) -> Result<PipelineRun, SeqprobeError> {
    writeln!(out, "\n--- Fetching Nucleotide Sequence ---")?;
    let record = source.fetch(&config.accession)?;
    info!("fetched {} ({} bp)", record.id, record.len());
    writeln!(out, "Accession: {}", record.id)?;
    writeln!(out, "Description: {}", record.description)?;
    writeln!(out, "Sequence length: {}", record.len())?;

    let summary = SequenceSummary::from_sequence(&record.seq);
    write_analysis(out, &record, &summary)?;

    let global = self_align(config, &record, AlignMode::Global)?;
    writeln!(out, "\n--- Global Alignment ---")?;
    writeln!(out, "Score: {}", format_float(global.score))?;
    writeln!(out, "{global}")?;

    let local = self_align(config, &record, AlignMode::Local)?;
    writeln!(out, "\n--- Local Alignment ---")?;
    writeln!(out, "Score: {}", format_float(local.score))?;
    writeln!(out, "{local}")?;

    let search = if config.skip_search {
        info!("similarity search skipped");
        None
    } else {
        let label = program_label(&config.program);
        writeln!(out, "\n--- Running {label} on database {} ---", config.database)?;
        let outcome = search_record(searcher, &record);
        write_search(out, &outcome, &label, config.top_hits)?;
        Some(outcome)
    };

    Ok(PipelineRun { record, summary, global, local, search })
}

fn self_align(config: &PipelineConfig, record: &SequenceRecord, mode: AlignMode) -> Result<PairwiseAlignment, SeqprobeError> {
    let params = AlignerParams { mode, ..config.aligner.clone() };
    let aln = align(&record.seq, &record.seq, &params)?;
    info!("{mode} self-alignment score {}", aln.score);
    Ok(aln)
}

fn write_analysis<W: Write + ?Sized>(out: &mut W, record: &SequenceRecord, s: &SequenceSummary) -> Result<(), SeqprobeError> {
    writeln!(out, "\n--- Sequence Analysis ---")?;
    writeln!(out, "Original Sequence: {}", record.seq)?;
    writeln!(out, "Complement: {}", s.complement)?;
    writeln!(out, "Reverse Complement: {}", s.reverse_complement)?;
    writeln!(out, "Transcription (DNA → RNA): {}", s.transcript)?;
    writeln!(out, "Translation (RNA → Protein): {}", s.protein)?;
    writeln!(out, "GC Content: {} %", format_float(s.gc_percent))?;
    Ok(())
}

/// Prints the top hits, or the failure line for the outcome.
pub fn write_search<W: Write + ?Sized>(out: &mut W, outcome: &SearchOutcome, label: &str, top: usize) -> Result<(), SeqprobeError> {
    match outcome {
        SearchOutcome::Success(matches) => {
            info!("search returned {} hit(s)", matches.len());
            writeln!(out, "\nTop {top} Alignments for {label}:")?;
            for m in matches.iter().take(top) {
                writeln!(out, "\nSequence: {}", m.title)?;
                writeln!(out, "Length: {}", m.length)?;
                for hsp in &m.hsps {
                    writeln!(out, "Score: {}, E-value: {}", format_float(hsp.score), format_evalue(hsp.expect))?;
                    writeln!(out, "Query: {}", hsp.query)?;
                    writeln!(out, "Match: {}", hsp.midline)?;
                    writeln!(out, "Subject: {}", hsp.subject)?;
                }
            }
        }
        SearchOutcome::NetworkFailure(reason) => {
            warn!("similarity search network failure: {reason}");
            writeln!(out, "URL Error: {reason}")?;
        }
        SearchOutcome::OtherFailure(message) => {
            warn!("similarity search failed: {message}");
            writeln!(out, "An error occurred: {message}")?;
        }
    }
    Ok(())
}

/// `blastn` reads as `BLASTn`, other programs are upper-cased.
pub fn program_label(program: &str) -> String {
    match program.strip_prefix("blast") {
        Some(rest) => format!("BLAST{rest}"),
        None => program.to_ascii_uppercase(),
    }
}

/// Whole numbers keep one decimal (`39.0`), others print as they are (`56.41`).
pub fn format_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

/// Small E-values in scientific notation, the rest as plain decimals.
pub fn format_evalue(e: f64) -> String {
    if e == 0.0 {
        "0.0".to_string()
    } else if e.abs() < 1e-3 {
        format!("{e:.2e}")
    } else {
        format!("{e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(program_label("blastn"), "BLASTn");
        assert_eq!(program_label("blastx"), "BLASTx");
        assert_eq!(program_label("tblastn"), "TBLASTN");
    }

    #[test]
    fn evalues() {
        assert_eq!(format_evalue(0.0), "0.0");
        assert_eq!(format_evalue(1.5e-5), "1.50e-5");
        assert_eq!(format_evalue(3.2), "3.2");
    }

    #[test]
    fn floats_always_show_a_decimal() {
        assert_eq!(format_float(39.0), "39.0");
        assert_eq!(format_float(100.0), "100.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(56.41), "56.41");
        assert_eq!(format_float(-2.5), "-2.5");
    }

    #[test]
    fn failure_lines() {
        let mut out = Vec::new();
        write_search(&mut out, &SearchOutcome::OtherFailure("bad reply".into()), "BLASTn", 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "An error occurred: bad reply\n");
    }
}
