//! Descriptive sequence transforms: complement, reverse complement,
//! transcription, translation and GC content.
//!
//! All functions are pure and do no validation. Unknown symbols pass through
//! the nucleotide transforms unchanged and translate to `X`.
//!
//! ### Example
//! ```rust
//! use seqprobe::{complement, reverse_complement, transcribe, translate, gc_percent};
//! assert_eq!(complement("ATGC"), "TACG");
//! assert_eq!(reverse_complement("ATGC"), "GCAT");
//! assert_eq!(transcribe("ATGTAA"), "AUGUAA");
//! assert_eq!(translate("ATGGCCTAAGGG", true), "MA");
//! assert_eq!(gc_percent("GGCA"), 75.0);
//! ```
use crate::genetic_code::{translate_codon, STOP};

/// IUPAC-aware base pairing; case is preserved.
pub fn complement_base(c: char) -> char {
    match c {
        'A' => 'T', 'T' => 'A', 'U' => 'A', 'G' => 'C', 'C' => 'G',
        'a' => 't', 't' => 'a', 'u' => 'a', 'g' => 'c', 'c' => 'g',
        'R' => 'Y', 'Y' => 'R', 'K' => 'M', 'M' => 'K',
        'r' => 'y', 'y' => 'r', 'k' => 'm', 'm' => 'k',
        'B' => 'V', 'V' => 'B', 'D' => 'H', 'H' => 'D',
        'b' => 'v', 'v' => 'b', 'd' => 'h', 'h' => 'd',
        // S, W and N are their own complements
        other => other,
    }
}

pub fn complement(seq: &str) -> String {
    seq.chars().map(complement_base).collect()
}

pub fn reverse_complement(seq: &str) -> String {
    seq.chars().rev().map(complement_base).collect()
}

/// DNA to RNA: `T` becomes `U`, nothing else changes.
pub fn transcribe(seq: &str) -> String {
    seq.chars()
        .map(|c| match c {
            'T' => 'U',
            't' => 'u',
            other => other,
        })
        .collect()
}

/// Translate in-frame codons with the standard code.
///
/// Accepts DNA or RNA. A trailing partial codon is ignored. With `to_stop`
/// the protein ends before the first stop codon and never contains `*`;
/// otherwise stops are emitted as `*`.
pub fn translate(seq: &str, to_stop: bool) -> String {
    let mut protein = String::with_capacity(seq.len() / 3);
    for codon in seq.as_bytes().chunks_exact(3) {
        let aa = translate_codon([codon[0], codon[1], codon[2]]);
        if to_stop && aa == STOP {
            break;
        }
        protein.push(aa);
    }
    protein
}

/// Fraction of `G`/`C` (and `S`) symbols over the full length.
pub fn gc_fraction(seq: &str) -> f64 {
    if seq.is_empty() {
        return 0.0;
    }
    let gc = seq
        .bytes()
        .map(|c| c.to_ascii_uppercase())
        .filter(|&c| c == b'G' || c == b'C' || c == b'S')
        .count();
    gc as f64 / seq.len() as f64
}

/// GC content as a percentage rounded to two decimals.
pub fn gc_percent(seq: &str) -> f64 {
    (gc_fraction(seq) * 100.0 * 100.0).round() / 100.0
}

/// Everything the analysis stage reports for one sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceSummary {
    pub complement: String,
    pub reverse_complement: String,
    pub transcript: String,
    pub protein: String,
    pub gc_percent: f64,
}

impl SequenceSummary {
    pub fn from_sequence(seq: &str) -> Self {
        let transcript = transcribe(seq);
        Self {
            complement: complement(seq),
            reverse_complement: reverse_complement(seq),
            protein: translate(&transcript, true),
            transcript,
            gc_percent: gc_percent(seq),
        }
    }
}
