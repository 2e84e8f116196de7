//! # seqprobe
//!
//! Exploratory analysis of a single nucleotide record, in four stages:
//!
//! 1. **fetch** the record from NCBI (E-utilities `efetch`, FASTA), or read
//!    it from a local FASTA file;
//! 2. **analyse** it: complement, reverse complement, transcription,
//!    translation to the first stop codon, GC content;
//! 3. **align** it against itself, globally and locally, with configurable
//!    match/mismatch/affine-gap scoring;
//! 4. **search** it with remote NCBI BLAST and report the top hits with
//!    every high-scoring segment pair.
//!
//! Each stage is usable on its own; [`pipeline::run`] strings them together
//! and prints the report. The network stages sit behind the
//! [`SequenceSource`] and [`SimilaritySearch`] traits.
//!
//! ### Example
//! ```
//! use seqprobe::{align, AlignerParams, AlignMode, SequenceSummary};
//! let seq = "ATGGCCATTGTAATGGGCCGCTGAAAG";
//! let summary = SequenceSummary::from_sequence(seq);
//! assert_eq!(summary.protein, "MAIVMGR");
//! let aln = align(seq, seq, &AlignerParams { mode: AlignMode::Local, ..Default::default() }).unwrap();
//! assert_eq!(aln.score, seq.len() as f64);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod align;
pub mod analysis;
pub mod blast;
pub mod blast_xml;
pub mod common;
pub mod entrez;
pub mod genetic_code;
pub mod pipeline;

pub use align::{align, AlignMode, AlignerParams, PairwiseAlignment};
pub use analysis::{complement, gc_fraction, gc_percent, reverse_complement, transcribe, translate, SequenceSummary};
pub use blast::{
    write_hsp_table, BlastClient, BlastConfig, Hsp, SearchOutcome, SearchStatus, SimilarityMatch, SimilaritySearch,
};
pub use blast_xml::{parse_blast_xml, BlastReport};
pub use common::{parse_fasta, read_single_fasta, FastaFileSource, SeqprobeError, SequenceRecord, SequenceSource};
pub use entrez::{EntrezClient, EntrezConfig};
pub use pipeline::{PipelineConfig, PipelineRun};
