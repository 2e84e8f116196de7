//! NCBI BLAST XML (`BlastOutput`) reader.
//!
//! Only the fields the report needs are modelled; everything else in the
//! document is ignored. The first `Iteration` is the result for the single
//! submitted query.

use serde::Deserialize;

use crate::blast::{Hsp, SimilarityMatch};
use crate::common::SeqprobeError;

/// Parsed BLAST result for one query.
#[derive(Clone, Debug, Default)]
pub struct BlastReport {
    pub program: Option<String>,
    pub version: Option<String>,
    pub database: Option<String>,
    pub query_len: Option<usize>,
    /// Informational text such as "No hits found".
    pub message: Option<String>,
    pub matches: Vec<SimilarityMatch>,
}

pub fn parse_blast_xml(xml: &str) -> Result<BlastReport, SeqprobeError> {
    if !xml.contains("<BlastOutput") {
        return Err(SeqprobeError::Blast("reply is not BLAST XML (missing <BlastOutput>)".into()));
    }
    let parsed: BlastOutputXml = quick_xml::de::from_str(xml)?;
    let iteration = parsed
        .iterations
        .and_then(|its| its.iterations.into_iter().next())
        .ok_or_else(|| SeqprobeError::Blast("BLAST XML holds no iterations".into()))?;

    let matches = iteration
        .hits
        .map(|h| h.hits)
        .unwrap_or_default()
        .into_iter()
        .map(hit_to_match)
        .collect();

    Ok(BlastReport {
        program: parsed.program,
        version: parsed.version,
        database: parsed.db,
        query_len: parsed.query_len,
        message: iteration.message.filter(|m| !m.trim().is_empty()),
        matches,
    })
}

fn hit_to_match(hit: HitXml) -> SimilarityMatch {
    let id = hit.id.unwrap_or_default();
    let def = hit.def.unwrap_or_default();
    let title = match (id.is_empty(), def.is_empty()) {
        (false, false) => format!("{id} {def}"),
        (false, true) => id,
        _ => def,
    };
    SimilarityMatch {
        title,
        accession: hit.accession.unwrap_or_default(),
        length: hit.len.unwrap_or(0),
        hsps: hit.hsps.map(|h| h.hsps).unwrap_or_default().into_iter().map(hsp_from_xml).collect(),
    }
}

fn hsp_from_xml(x: HspXml) -> Hsp {
    let query = x.qseq.unwrap_or_default();
    let subject = x.hseq.unwrap_or_default();
    let midline = match x.midline {
        Some(m) if m.len() == query.len() => m,
        // whitespace at either end of the midline does not survive XML text trimming
        _ => rebuild_midline(&query, &subject),
    };
    Hsp {
        score: x.score.unwrap_or(0.0),
        bit_score: x.bit_score.unwrap_or(0.0),
        expect: x.evalue.unwrap_or(f64::NAN),
        identities: x.identity.unwrap_or(0),
        align_len: x.align_len.unwrap_or(query.len()),
        query_range: (x.query_from.unwrap_or(0), x.query_to.unwrap_or(0)),
        subject_range: (x.hit_from.unwrap_or(0), x.hit_to.unwrap_or(0)),
        query,
        midline,
        subject,
    }
}

/// Nucleotide midline: `|` where query and subject agree, blank elsewhere.
fn rebuild_midline(query: &str, subject: &str) -> String {
    query
        .bytes()
        .zip(subject.bytes())
        .map(|(q, s)| if q != b'-' && q.eq_ignore_ascii_case(&s) { '|' } else { ' ' })
        .collect()
}

#[derive(Debug, Deserialize)]
struct BlastOutputXml {
    #[serde(rename = "BlastOutput_program")]
    program: Option<String>,
    #[serde(rename = "BlastOutput_version")]
    version: Option<String>,
    #[serde(rename = "BlastOutput_db")]
    db: Option<String>,
    #[serde(rename = "BlastOutput_query-len")]
    query_len: Option<usize>,
    #[serde(rename = "BlastOutput_iterations")]
    iterations: Option<IterationsXml>,
}

#[derive(Debug, Deserialize)]
struct IterationsXml {
    #[serde(rename = "Iteration", default)]
    iterations: Vec<IterationXml>,
}

#[derive(Debug, Deserialize)]
struct IterationXml {
    #[serde(rename = "Iteration_hits")]
    hits: Option<HitsXml>,
    #[serde(rename = "Iteration_message")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HitsXml {
    #[serde(rename = "Hit", default)]
    hits: Vec<HitXml>,
}

#[derive(Debug, Deserialize)]
struct HitXml {
    #[serde(rename = "Hit_id")]
    id: Option<String>,
    #[serde(rename = "Hit_def")]
    def: Option<String>,
    #[serde(rename = "Hit_accession")]
    accession: Option<String>,
    #[serde(rename = "Hit_len")]
    len: Option<usize>,
    #[serde(rename = "Hit_hsps")]
    hsps: Option<HspsXml>,
}

#[derive(Debug, Deserialize)]
struct HspsXml {
    #[serde(rename = "Hsp", default)]
    hsps: Vec<HspXml>,
}

#[derive(Debug, Deserialize)]
struct HspXml {
    #[serde(rename = "Hsp_bit-score")]
    bit_score: Option<f64>,
    #[serde(rename = "Hsp_score")]
    score: Option<f64>,
    #[serde(rename = "Hsp_evalue")]
    evalue: Option<f64>,
    #[serde(rename = "Hsp_query-from")]
    query_from: Option<usize>,
    #[serde(rename = "Hsp_query-to")]
    query_to: Option<usize>,
    #[serde(rename = "Hsp_hit-from")]
    hit_from: Option<usize>,
    #[serde(rename = "Hsp_hit-to")]
    hit_to: Option<usize>,
    #[serde(rename = "Hsp_identity")]
    identity: Option<usize>,
    #[serde(rename = "Hsp_align-len")]
    align_len: Option<usize>,
    #[serde(rename = "Hsp_qseq")]
    qseq: Option<String>,
    #[serde(rename = "Hsp_hseq")]
    hseq: Option<String>,
    #[serde(rename = "Hsp_midline")]
    midline: Option<String>,
}
