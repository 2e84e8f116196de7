//! Common helpers shared by the pipeline stages: the crate error type, the
//! [`SequenceRecord`] produced by every sequence source, and a minimal FASTA
//! parser.
//!
//! ## FASTA
//! The parser is permissive and meant for single records or small
//! multi-record files such as an `efetch` response. Text before the first
//! header is ignored, sequence lines are stripped of whitespace and
//! upper-cased.
//!
//! ## Examples
//! ```rust
//! use seqprobe::parse_fasta;
//! let recs = parse_fasta(">NM_1.2 some gene\nacgt\nAC\n>p\nGG\n");
//! assert_eq!(recs.len(), 2);
//! assert_eq!(recs[0].id, "NM_1.2");
//! assert_eq!(recs[0].description, "NM_1.2 some gene");
//! assert_eq!(recs[0].seq, "ACGTAC");
//! ```

use std::fs;
use std::path::PathBuf;

/// Errors that can be returned by the stages in this crate.
#[derive(thiserror::Error, Debug)]
pub enum SeqprobeError {
    /// Transport failure or non-success HTTP status while talking to NCBI.
    #[error("network request failed: {reason}")]
    Network { reason: String },
    /// Returned when a FASTA payload does not hold exactly one usable record.
    #[error("invalid FASTA input: {0}")]
    InvalidFasta(String),
    /// Returned when sequence input is empty or otherwise invalid.
    #[error("invalid sequence input: {0}")]
    InvalidSequence(&'static str),
    /// Returned for negative gap penalties and similar scoring mistakes.
    #[error("invalid alignment parameters: {0}")]
    InvalidParams(String),
    /// Returned when a configured service URL does not parse.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Returned when the BLAST service reports a failure or an unexpected reply.
    #[error("BLAST search failed: {0}")]
    Blast(String),
    /// Returned when BLAST XML output cannot be deserialized.
    #[error("malformed BLAST XML: {0}")]
    Xml(#[from] quick_xml::de::DeError),
    #[error("could not write table: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SeqprobeError {
    /// The underlying failure reason for network errors.
    pub fn network_reason(&self) -> Option<&str> {
        match self {
            SeqprobeError::Network { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SeqprobeError {
    fn from(err: reqwest::Error) -> Self {
        SeqprobeError::Network { reason: error_chain(&err) }
    }
}

/// Render an error together with its `source()` chain, `outer: inner: ...`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !reason.contains(&text) {
            reason.push_str(": ");
            reason.push_str(&text);
        }
        source = cause.source();
    }
    reason
}

/// A single nucleotide record as returned by a [`SequenceSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceRecord {
    /// First whitespace-delimited token of the FASTA header.
    pub id: String,
    /// Full header line after `>` (starts with the id).
    pub description: String,
    /// Uppercase sequence letters, whitespace removed.
    pub seq: String,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>, seq: impl Into<String>) -> Self {
        Self { id: id.into(), description: description.into(), seq: seq.into() }
    }

    fn from_header(header: &str, seq: &str) -> Self {
        let id = header.split_whitespace().next().unwrap_or("").to_string();
        Self { id, description: header.to_string(), seq: seq.to_ascii_uppercase() }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Parse a FASTA string into a vector of [`SequenceRecord`].
///
/// *Lines starting with `>` start a new record.* All other lines are appended
/// (without whitespace) to the current sequence.
///
/// ## Panics
/// This function does not panic.
pub fn parse_fasta(text: &str) -> Vec<SequenceRecord> {
    let mut out: Vec<SequenceRecord> = vec![];
    let mut header: Option<String> = None;
    let mut seq = String::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix('>') {
            if let Some(h) = header.take() {
                out.push(SequenceRecord::from_header(&h, &seq));
                seq.clear();
            }
            header = Some(rest.trim().to_string());
        } else if header.is_some() {
            seq.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if let Some(h) = header {
        out.push(SequenceRecord::from_header(&h, &seq));
    }
    out
}

/// Parse a FASTA payload that must hold exactly one record.
pub fn read_single_fasta(text: &str) -> Result<SequenceRecord, SeqprobeError> {
    let mut recs = parse_fasta(text);
    match recs.len() {
        0 => Err(SeqprobeError::InvalidFasta("no records found".into())),
        1 => Ok(recs.remove(0)),
        n => Err(SeqprobeError::InvalidFasta(format!("expected one record, found {n}"))),
    }
}

/// Anything that can produce the record for an accession.
pub trait SequenceSource {
    fn fetch(&self, accession: &str) -> Result<SequenceRecord, SeqprobeError>;
}

/// Reads records from a local FASTA file instead of the network.
#[derive(Clone, Debug)]
pub struct FastaFileSource {
    path: PathBuf,
}

impl FastaFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SequenceSource for FastaFileSource {
    /// Returns the record whose id matches `accession` (with or without a
    /// version suffix), or the first record of the file.
    fn fetch(&self, accession: &str) -> Result<SequenceRecord, SeqprobeError> {
        let text = fs::read_to_string(&self.path)?;
        let mut recs = parse_fasta(&text);
        if recs.is_empty() {
            return Err(SeqprobeError::InvalidFasta(format!("no FASTA records in {}", self.path.display())));
        }
        let hit = recs.iter().position(|r| accession_matches(&r.id, accession)).unwrap_or(0);
        log::debug!("read {} record(s) from {}, using #{hit}", recs.len(), self.path.display());
        Ok(recs.swap_remove(hit))
    }
}

/// `NM_001301717.2` matches both `NM_001301717.2` and `NM_001301717`.
pub(crate) fn accession_matches(id: &str, accession: &str) -> bool {
    if accession.is_empty() {
        return false;
    }
    id == accession || id.split('.').next() == Some(accession)
}
