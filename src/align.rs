//! Pairwise global (Needleman–Wunsch) and local (Smith–Waterman) alignment
//! with affine gaps (Gotoh).
//!
//! Scores are kept in rolling rows; only the traceback is stored for the
//! full matrix, one byte per cell. A gap of length `k` costs
//! `gap_open + (k - 1) * gap_extend`.
//!
//! Ties prefer the diagonal, then a gap in the query, then a gap in the
//! target, so the reported alignment of a sequence against itself is the
//! gap-free identity alignment.
//!
//! ### Example
//! ```rust
//! use seqprobe::{align, AlignerParams, AlignMode};
//! let params = AlignerParams { mode: AlignMode::Local, ..Default::default() };
//! let aln = align("GATTACA", "GATTACA", &params).unwrap();
//! assert_eq!(aln.score, 7.0);
//! assert_eq!(aln.cigar(), "7M");
//! ```
use std::fmt;

use crate::common::SeqprobeError;

/// Largest traceback matrix we are willing to allocate (one byte per cell).
const MAX_MATRIX_CELLS: usize = 1 << 30;

/// Columns per block in the text rendering.
const BLOCK_WIDTH: usize = 60;

// Traceback byte layout: bits 0-1 hold the source of H, bit 2 and bit 3
// record whether E / F at this cell extended an existing gap.
const FROM_STOP: u8 = 0;
const FROM_DIAG: u8 = 1;
const FROM_UP: u8 = 2;
const FROM_LEFT: u8 = 3;
const E_EXTENDED: u8 = 1 << 2;
const F_EXTENDED: u8 = 1 << 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignMode {
    Global,
    Local,
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignMode::Global => write!(f, "global"),
            AlignMode::Local => write!(f, "local"),
        }
    }
}

/// Scoring and mode for [`align`].
#[derive(Clone, Debug)]
pub struct AlignerParams {
    pub mode: AlignMode,
    /// Score for identical symbols (case-insensitive).
    pub match_score: f64,
    /// Score for differing symbols.
    pub mismatch_score: f64,
    /// Penalty (non-negative, subtracted) for the first position of a gap.
    pub gap_open: f64,
    /// Penalty (non-negative, subtracted) for each further gap position.
    pub gap_extend: f64,
}

impl Default for AlignerParams {
    fn default() -> Self {
        Self { mode: AlignMode::Global, match_score: 1.0, mismatch_score: 0.0, gap_open: 0.0, gap_extend: 0.0 }
    }
}

/// Best-scoring alignment between a target and a query.
#[derive(Clone, Debug)]
pub struct PairwiseAlignment {
    pub mode: AlignMode,
    pub score: f64,
    /// Start (inclusive) and end (exclusive), in characters, of the aligned region in the target.
    pub target_range: (usize, usize),
    /// Start (inclusive) and end (exclusive), in characters, of the aligned region in the query.
    pub query_range: (usize, usize),
    /// Aligned target, gaps as `-`.
    pub aligned_target: String,
    /// Aligned query, gaps as `-`.
    pub aligned_query: String,
}

impl PairwiseAlignment {
    /// `|` identity, `.` mismatch, `-` gap.
    pub fn markup(&self) -> String {
        self.aligned_target
            .chars()
            .zip(self.aligned_query.chars())
            .map(|(x, y)| {
                if x == '-' || y == '-' {
                    '-'
                } else if x.eq_ignore_ascii_case(&y) {
                    '|'
                } else {
                    '.'
                }
            })
            .collect()
    }

    pub fn columns(&self) -> usize {
        self.aligned_target.chars().count()
    }

    /// Percent identity over aligned columns (0..=100).
    pub fn identity(&self) -> f64 {
        let ident = self.markup().chars().filter(|&c| c == '|').count();
        ident as f64 * 100.0 / self.columns().max(1) as f64
    }

    /// Percent gaps over aligned columns (0..=100).
    pub fn gaps(&self) -> f64 {
        let gaps = self.markup().chars().filter(|&c| c == '-').count();
        gaps as f64 * 100.0 / self.columns().max(1) as f64
    }

    /// CIGAR-like operations relative to the target (e.g. `10M1I5M2D`).
    pub fn cigar(&self) -> String {
        let mut ops: Vec<(char, usize)> = Vec::new();
        for (x, y) in self.aligned_target.chars().zip(self.aligned_query.chars()) {
            let op = if x == '-' { 'I' } else if y == '-' { 'D' } else { 'M' };
            push_cigar(&mut ops, op, 1);
        }
        ops.into_iter().map(|(op, len)| format!("{len}{op}")).collect()
    }
}

impl fmt::Display for PairwiseAlignment {
    /// Blocks of 60 columns: target, markup, query, each with start and end
    /// coordinates.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t: Vec<char> = self.aligned_target.chars().collect();
        let q: Vec<char> = self.aligned_query.chars().collect();
        let mid: Vec<char> = self.markup().chars().collect();
        let text = |s: &[char]| s.iter().collect::<String>();
        let mut tpos = self.target_range.0;
        let mut qpos = self.query_range.0;
        let mut col = 0usize;
        while col < t.len() {
            let end = (col + BLOCK_WIDTH).min(t.len());
            let tnext = tpos + t[col..end].iter().filter(|&&c| c != '-').count();
            let qnext = qpos + q[col..end].iter().filter(|&&c| c != '-').count();
            if col > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{:<10}{:>9} {} {}", "target", tpos, text(&t[col..end]), tnext)?;
            writeln!(f, "{:<10}{:>9} {} {}", "", col, text(&mid[col..end]), end)?;
            writeln!(f, "{:<10}{:>9} {} {}", "query", qpos, text(&q[col..end]), qnext)?;
            tpos = tnext;
            qpos = qnext;
            col = end;
        }
        Ok(())
    }
}

/// Align `query` against `target` and return the first best-scoring alignment.
pub fn align(target: &str, query: &str, params: &AlignerParams) -> Result<PairwiseAlignment, SeqprobeError> {
    if target.is_empty() || query.is_empty() {
        return Err(SeqprobeError::InvalidSequence("empty sequence"));
    }
    if params.gap_open < 0.0 || params.gap_extend < 0.0 {
        return Err(SeqprobeError::InvalidParams(format!(
            "gap penalties must be >= 0 (open={}, extend={})",
            params.gap_open, params.gap_extend
        )));
    }
    let a: Vec<char> = target.chars().collect();
    let b: Vec<char> = query.chars().collect();
    let n = a.len();
    let m = b.len();
    let width = m + 1;
    let cells = (n + 1).checked_mul(width).filter(|&c| c <= MAX_MATRIX_CELLS);
    let Some(cells) = cells else {
        return Err(SeqprobeError::InvalidSequence("sequences too long for pairwise alignment"));
    };
    let global = params.mode == AlignMode::Global;
    let go = params.gap_open;
    let ge = params.gap_extend;
    let neg_inf = f64::NEG_INFINITY;
    let gap_cost = |k: usize| go + (k as f64 - 1.0) * ge;
    let score_pair = |x: char, y: char| -> f64 {
        if x.eq_ignore_ascii_case(&y) { params.match_score } else { params.mismatch_score }
    };

    let mut tb = vec![FROM_STOP; cells];
    let mut prev_h = vec![0.0f64; width];
    let mut cur_h = vec![0.0f64; width];
    // F (gap in query, vertical move) of the previous row, per column
    let mut f_row = vec![neg_inf; width];

    if global {
        for j in 1..=m {
            prev_h[j] = -gap_cost(j);
            tb[j] = FROM_LEFT | if j > 1 { E_EXTENDED } else { 0 };
        }
    }

    let mut max_score = 0.0f64;
    let (mut max_i, mut max_j) = (0usize, 0usize);

    for i in 1..=n {
        let row = i * width;
        if global {
            cur_h[0] = -gap_cost(i);
            tb[row] = FROM_UP | if i > 1 { F_EXTENDED } else { 0 };
        } else {
            cur_h[0] = 0.0;
        }
        // E (gap in target, horizontal move) of the cell to the left
        let mut e = neg_inf;
        for j in 1..=m {
            let mut code = 0u8;

            let e_open = cur_h[j - 1] - go;
            let e_ext = e - ge;
            e = if e_ext > e_open {
                code |= E_EXTENDED;
                e_ext
            } else {
                e_open
            };

            let f_open = prev_h[j] - go;
            let f_ext = f_row[j] - ge;
            let f = if f_ext > f_open {
                code |= F_EXTENDED;
                f_ext
            } else {
                f_open
            };
            f_row[j] = f;

            let diag = prev_h[j - 1] + score_pair(a[i - 1], b[j - 1]);
            let mut best = diag.max(f).max(e);
            if !global {
                best = best.max(0.0);
            }
            let usable = |v: f64| v == best && (global || v > 0.0);
            let dir = if usable(diag) {
                FROM_DIAG
            } else if usable(f) {
                FROM_UP
            } else if usable(e) {
                FROM_LEFT
            } else {
                FROM_STOP
            };
            cur_h[j] = best;
            tb[row + j] = code | dir;

            if !global && best > max_score {
                max_score = best;
                max_i = i;
                max_j = j;
            }
        }
        std::mem::swap(&mut prev_h, &mut cur_h);
    }

    let (score, mut i, mut j) = if global { (prev_h[m], n, m) } else { (max_score, max_i, max_j) };
    let (end_i, end_j) = (i, j);

    #[derive(Clone, Copy, PartialEq)]
    enum State {
        H,
        E,
        F,
    }
    let mut state = State::H;
    let mut t_aln: Vec<char> = Vec::new();
    let mut q_aln: Vec<char> = Vec::new();
    while i > 0 || j > 0 {
        let code = tb[i * width + j];
        match state {
            State::H => match code & 0b11 {
                FROM_DIAG if i > 0 && j > 0 => {
                    t_aln.push(a[i - 1]);
                    q_aln.push(b[j - 1]);
                    i -= 1;
                    j -= 1;
                }
                FROM_UP => state = State::F,
                FROM_LEFT => state = State::E,
                _ => break,
            },
            State::F => {
                if i == 0 {
                    break;
                }
                t_aln.push(a[i - 1]);
                q_aln.push('-');
                i -= 1;
                if code & F_EXTENDED == 0 {
                    state = State::H;
                }
            }
            State::E => {
                if j == 0 {
                    break;
                }
                t_aln.push('-');
                q_aln.push(b[j - 1]);
                j -= 1;
                if code & E_EXTENDED == 0 {
                    state = State::H;
                }
            }
        }
    }
    t_aln.reverse();
    q_aln.reverse();

    Ok(PairwiseAlignment {
        mode: params.mode,
        score,
        target_range: (i, end_i),
        query_range: (j, end_j),
        aligned_target: t_aln.into_iter().collect(),
        aligned_query: q_aln.into_iter().collect(),
    })
}

fn push_cigar(ops: &mut Vec<(char, usize)>, op: char, k: usize) {
    if let Some(last) = ops.last_mut() {
        if last.0 == op {
            last.1 += k;
            return;
        }
    }
    ops.push((op, k));
}
