//! The standard genetic code (NCBI translation table 1).
//!
//! Codons are looked up in the canonical `TCAG` order used by NCBI's
//! published tables. Ambiguous IUPAC codons are expanded; when every
//! expansion encodes the same residue that residue is returned (e.g. `CTN`
//! is always leucine), otherwise `X`.

/// Amino acids for codons in `TCAG` x `TCAG` x `TCAG` order.
const TABLE_1: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// Symbol emitted for stop codons.
pub const STOP: char = '*';
/// Symbol emitted for codons that cannot be resolved.
pub const UNKNOWN: char = 'X';

fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Concrete bases an IUPAC symbol stands for, as `TCAG` indices.
fn expand(b: u8) -> &'static [usize] {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => &[0],
        b'C' => &[1],
        b'A' => &[2],
        b'G' => &[3],
        b'Y' => &[0, 1],
        b'R' => &[2, 3],
        b'W' => &[0, 2],
        b'S' => &[1, 3],
        b'K' => &[0, 3],
        b'M' => &[1, 2],
        b'B' => &[0, 1, 3],
        b'D' => &[0, 2, 3],
        b'H' => &[0, 1, 2],
        b'V' => &[1, 2, 3],
        b'N' => &[0, 1, 2, 3],
        _ => &[],
    }
}

/// Translate one codon (DNA or RNA alphabet, any case).
pub fn translate_codon(codon: [u8; 3]) -> char {
    if let (Some(a), Some(b), Some(c)) = (base_index(codon[0]), base_index(codon[1]), base_index(codon[2])) {
        return TABLE_1[a * 16 + b * 4 + c] as char;
    }
    let mut residue: Option<u8> = None;
    for &a in expand(codon[0]) {
        for &b in expand(codon[1]) {
            for &c in expand(codon[2]) {
                let aa = TABLE_1[a * 16 + b * 4 + c];
                match residue {
                    None => residue = Some(aa),
                    Some(r) if r != aa => return UNKNOWN,
                    Some(_) => {}
                }
            }
        }
    }
    residue.map(char::from).unwrap_or(UNKNOWN)
}
