//! Remote similarity search through the NCBI BLAST URL API (`Blast.cgi`).
//!
//! A search is three kinds of request against the same endpoint:
//!
//! 1. `CMD=Put` submits the query and returns a request id (RID) and an
//!    estimated time to completion (RTOE, seconds) in a `QBlastInfo` block.
//! 2. `CMD=Get&FORMAT_OBJECT=SearchInfo` reports `Status=WAITING`,
//!    `READY`, `FAILED` or `UNKNOWN` (expired RID).
//! 3. `CMD=Get&FORMAT_TYPE=XML` returns the finished result as BLAST XML.
//!
//! NCBI asks clients not to poll a RID more than once a minute, which is the
//! default poll interval. There is no overall deadline.
use std::io;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Url;

use crate::blast_xml::{parse_blast_xml, BlastReport};
use crate::common::{SeqprobeError, SequenceRecord};
use crate::entrez::{build_http_client, parse_url};

pub const BLAST_URL: &str = "https://blast.ncbi.nlm.nih.gov/Blast.cgi";

/// One high-scoring segment pair of a hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Hsp {
    /// Raw alignment score.
    pub score: f64,
    pub bit_score: f64,
    /// Expectation value.
    pub expect: f64,
    pub identities: usize,
    pub align_len: usize,
    /// 1-based inclusive coordinates on the query.
    pub query_range: (usize, usize),
    /// 1-based inclusive coordinates on the subject.
    pub subject_range: (usize, usize),
    pub query: String,
    pub midline: String,
    pub subject: String,
}

/// A database hit with its segment pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatch {
    /// Hit id and definition line.
    pub title: String,
    pub accession: String,
    pub length: usize,
    pub hsps: Vec<Hsp>,
}

/// Anything that can run a similarity search for one sequence.
pub trait SimilaritySearch {
    fn search(&self, sequence: &str) -> Result<Vec<SimilarityMatch>, SeqprobeError>;
}

/// Result of the search stage as seen by the report.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Success(Vec<SimilarityMatch>),
    /// Transport or HTTP failure, with the underlying reason.
    NetworkFailure(String),
    /// Anything else: service-reported failure, unreadable reply.
    OtherFailure(String),
}

impl From<Result<Vec<SimilarityMatch>, SeqprobeError>> for SearchOutcome {
    fn from(res: Result<Vec<SimilarityMatch>, SeqprobeError>) -> Self {
        match res {
            Ok(matches) => SearchOutcome::Success(matches),
            Err(SeqprobeError::Network { reason }) => SearchOutcome::NetworkFailure(reason),
            Err(other) => SearchOutcome::OtherFailure(other.to_string()),
        }
    }
}

/// Status reported by `FORMAT_OBJECT=SearchInfo`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Waiting,
    Ready { has_hits: bool },
    Failed,
    Unknown,
}

/// Settings for [`BlastClient`].
#[derive(Clone, Debug)]
pub struct BlastConfig {
    pub base_url: String,
    pub program: String,
    pub database: String,
    /// Number of hits requested from the service.
    pub hitlist_size: usize,
    /// E-value threshold.
    pub expect: f64,
    pub alignments: usize,
    pub descriptions: usize,
    pub megablast: bool,
    pub poll_interval: Duration,
    pub email: String,
    pub tool: String,
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            base_url: BLAST_URL.to_string(),
            program: "blastn".to_string(),
            database: "nt".to_string(),
            hitlist_size: 50,
            expect: 10.0,
            alignments: 500,
            descriptions: 500,
            megablast: false,
            poll_interval: Duration::from_secs(60),
            email: String::new(),
            tool: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

pub struct BlastClient {
    config: BlastConfig,
    base: Url,
    http: Client,
}

impl BlastClient {
    pub fn new(config: BlastConfig) -> Result<Self, SeqprobeError> {
        let base = parse_url(&config.base_url)?;
        let http = build_http_client()?;
        Ok(Self { config, base, http })
    }

    /// Submit `sequence`; returns the RID and the estimated seconds to completion.
    pub fn submit(&self, sequence: &str) -> Result<(String, u64), SeqprobeError> {
        let mut form: Vec<(&str, String)> = vec![
            ("CMD", "Put".into()),
            ("PROGRAM", self.config.program.clone()),
            ("DATABASE", self.config.database.clone()),
            ("QUERY", sequence.to_string()),
            ("HITLIST_SIZE", self.config.hitlist_size.to_string()),
            ("EXPECT", self.config.expect.to_string()),
            ("tool", self.config.tool.clone()),
        ];
        if self.config.megablast {
            form.push(("MEGABLAST", "on".into()));
        }
        if !self.config.email.is_empty() {
            form.push(("email", self.config.email.clone()));
        }
        info!(
            "submitting {} bp to {} against {}",
            sequence.len(),
            self.config.program,
            self.config.database
        );
        let body = self.http.post(self.base.clone()).form(&form).send()?.error_for_status()?.text()?;
        let (rid, rtoe) = parse_put_response(&body)?;
        info!("BLAST request {rid} accepted, estimated {rtoe}s");
        Ok((rid, rtoe))
    }

    /// Query the status of `rid` once.
    pub fn status(&self, rid: &str) -> Result<SearchStatus, SeqprobeError> {
        let url = self.get_url(&[("CMD", "Get"), ("FORMAT_OBJECT", "SearchInfo"), ("RID", rid)]);
        debug!("GET {url}");
        let body = self.http.get(url).send()?.error_for_status()?.text()?;
        parse_search_info(&body)
    }

    /// Block until `rid` is ready, sleeping `rtoe` seconds first.
    pub fn poll(&self, rid: &str, rtoe: u64) -> Result<(), SeqprobeError> {
        thread::sleep(Duration::from_secs(rtoe));
        let mut polls = 0usize;
        loop {
            polls += 1;
            match self.status(rid)? {
                SearchStatus::Waiting => {
                    info!("BLAST request {rid} still running (poll {polls})");
                    thread::sleep(self.config.poll_interval);
                }
                SearchStatus::Ready { has_hits } => {
                    info!("BLAST request {rid} ready after {polls} poll(s), hits: {has_hits}");
                    return Ok(());
                }
                SearchStatus::Failed => {
                    return Err(SeqprobeError::Blast(format!("search {rid} failed on the server")));
                }
                SearchStatus::Unknown => {
                    return Err(SeqprobeError::Blast(format!("search {rid} expired or is unknown")));
                }
            }
        }
    }

    /// Download the finished result as XML.
    pub fn fetch_xml(&self, rid: &str) -> Result<String, SeqprobeError> {
        let alignments = self.config.alignments.to_string();
        let descriptions = self.config.descriptions.to_string();
        let url = self.get_url(&[
            ("CMD", "Get"),
            ("RID", rid),
            ("FORMAT_TYPE", "XML"),
            ("ALIGNMENTS", &alignments),
            ("DESCRIPTIONS", &descriptions),
        ]);
        debug!("GET {url}");
        let body = self.http.get(url).send()?.error_for_status()?.text()?;
        debug!("BLAST XML is {} bytes", body.len());
        Ok(body)
    }

    /// Submit, wait and parse: the whole search for one sequence.
    pub fn qblast(&self, sequence: &str) -> Result<BlastReport, SeqprobeError> {
        let (rid, rtoe) = self.submit(sequence)?;
        self.poll(&rid, rtoe)?;
        let report = parse_blast_xml(&self.fetch_xml(&rid)?)?;
        info!(
            "{} {} on {}: query {} bp, {} hit(s)",
            report.program.as_deref().unwrap_or("BLAST"),
            report.version.as_deref().unwrap_or(""),
            report.database.as_deref().unwrap_or(&self.config.database),
            report.query_len.unwrap_or(sequence.len()),
            report.matches.len()
        );
        if let Some(msg) = &report.message {
            info!("BLAST: {msg}");
        }
        Ok(report)
    }

    fn get_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().extend_pairs(params.iter().copied()).append_pair("tool", &self.config.tool);
        url
    }
}

impl SimilaritySearch for BlastClient {
    fn search(&self, sequence: &str) -> Result<Vec<SimilarityMatch>, SeqprobeError> {
        Ok(self.qblast(sequence)?.matches)
    }
}

/// Extract `RID` and `RTOE` from the `QBlastInfo` block of a Put reply.
pub fn parse_put_response(body: &str) -> Result<(String, u64), SeqprobeError> {
    let rid = qblast_info_value(body, "RID").filter(|v| !v.is_empty());
    let Some(rid) = rid else {
        let hint = body.lines().map(str::trim).find(|l| l.to_ascii_lowercase().contains("error")).unwrap_or("");
        return Err(SeqprobeError::Blast(format!("no RID in BLAST reply {hint}").trim_end().to_string()));
    };
    let rtoe = match qblast_info_value(body, "RTOE") {
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!("unreadable RTOE '{v}', not waiting");
            0
        }),
        None => 0,
    };
    Ok((rid.to_string(), rtoe))
}

/// Read a `Status=` line from a SearchInfo reply.
pub fn parse_search_info(body: &str) -> Result<SearchStatus, SeqprobeError> {
    let field = |name: &str| {
        body.lines()
            .map(str::trim)
            .find_map(|l| l.strip_prefix(name).and_then(|rest| rest.trim_start().strip_prefix('=')))
            .map(str::trim)
    };
    match field("Status") {
        Some("WAITING") => Ok(SearchStatus::Waiting),
        Some("FAILED") => Ok(SearchStatus::Failed),
        Some("UNKNOWN") => Ok(SearchStatus::Unknown),
        Some("READY") => Ok(SearchStatus::Ready { has_hits: field("ThereAreHits") == Some("yes") }),
        Some(other) => Err(SeqprobeError::Blast(format!("unexpected search status '{other}'"))),
        None => Err(SeqprobeError::Blast("no status in SearchInfo reply".into())),
    }
}

fn qblast_info_value<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let start = body.find("QBlastInfoBegin").unwrap_or(0);
    let end = body[start..].find("QBlastInfoEnd").map(|e| start + e).unwrap_or(body.len());
    body[start..end].lines().map(str::trim).find_map(|l| {
        let (k, v) = l.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Tab-separated table of every HSP in `matches` (one row per HSP).
pub fn write_hsp_table<W: io::Write>(matches: &[SimilarityMatch], writer: W) -> Result<(), SeqprobeError> {
    let mut w = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    w.write_record([
        "rank", "accession", "title", "length", "score", "bit_score", "evalue", "identities", "align_len",
        "query_from", "query_to", "subject_from", "subject_to",
    ])?;
    for (rank, m) in matches.iter().enumerate() {
        for h in &m.hsps {
            w.write_record([
                (rank + 1).to_string(),
                m.accession.clone(),
                m.title.clone(),
                m.length.to_string(),
                h.score.to_string(),
                h.bit_score.to_string(),
                h.expect.to_string(),
                h.identities.to_string(),
                h.align_len.to_string(),
                h.query_range.0.to_string(),
                h.query_range.1.to_string(),
                h.subject_range.0.to_string(),
                h.subject_range.1.to_string(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Convenience for sources that hand over a whole record.
pub fn search_record<S: SimilaritySearch + ?Sized>(searcher: &S, record: &SequenceRecord) -> SearchOutcome {
    searcher.search(&record.seq).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::loopback::{closed_port_url, serve};

    const PUT_REPLY: &str = r#"<html><body>
<!--QBlastInfoBegin
    RID = 8XK2Y4P1016
    RTOE = 21
QBlastInfoEnd
--></body></html>"#;

    #[test]
    fn put_reply_yields_rid_and_rtoe() {
        let (rid, rtoe) = parse_put_response(PUT_REPLY).unwrap();
        assert_eq!(rid, "8XK2Y4P1016");
        assert_eq!(rtoe, 21);
    }

    #[test]
    fn put_reply_without_rid_is_an_error() {
        let err = parse_put_response("<p class=\"error\">Error: query is empty</p>").unwrap_err();
        assert!(matches!(err, SeqprobeError::Blast(_)));
        assert!(err.to_string().contains("query is empty"));
    }

    #[test]
    fn search_info_statuses() {
        let info = |s: &str| parse_search_info(&format!("<!--QBlastInfoBegin\n    Status={s}\nQBlastInfoEnd\n-->"));
        assert_eq!(info("WAITING").unwrap(), SearchStatus::Waiting);
        assert_eq!(info("FAILED").unwrap(), SearchStatus::Failed);
        assert_eq!(info("UNKNOWN").unwrap(), SearchStatus::Unknown);
        assert_eq!(info("READY").unwrap(), SearchStatus::Ready { has_hits: false });
        let ready = parse_search_info("QBlastInfoBegin\n  Status=READY\nQBlastInfoEnd\nQBlastInfoBegin\n  ThereAreHits=yes\nQBlastInfoEnd").unwrap();
        assert_eq!(ready, SearchStatus::Ready { has_hits: true });
        assert!(parse_search_info("<html></html>").is_err());
    }

    #[test]
    fn outcome_separates_network_failures() {
        let net: SearchOutcome = Err(SeqprobeError::Network { reason: "dns error".into() }).into();
        assert_eq!(net, SearchOutcome::NetworkFailure("dns error".into()));
        let other: SearchOutcome = Err(SeqprobeError::Blast("search X failed on the server".into())).into();
        assert!(matches!(other, SearchOutcome::OtherFailure(m) if m.contains("failed on the server")));
        let ok: SearchOutcome = Ok(vec![]).into();
        assert_eq!(ok, SearchOutcome::Success(vec![]));
    }

    #[test]
    fn hsp_table_has_one_row_per_hsp() {
        let hsp = Hsp {
            score: 24.0,
            bit_score: 22.3,
            expect: 1e-5,
            identities: 12,
            align_len: 12,
            query_range: (1, 12),
            subject_range: (5, 16),
            query: "A".into(),
            midline: "|".into(),
            subject: "A".into(),
        };
        let m = SimilarityMatch { title: "t".into(), accession: "X1".into(), length: 100, hsps: vec![hsp.clone(), hsp] };
        let mut out = Vec::new();
        write_hsp_table(&[m], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().starts_with("1\tX1\tt\t100\t24\t"));
    }

    const ONE_HIT_XML: &str = r#"<?xml version="1.0"?>
<BlastOutput>
  <BlastOutput_program>blastn</BlastOutput_program>
  <BlastOutput_db>nt</BlastOutput_db>
  <BlastOutput_iterations>
    <Iteration>
      <Iteration_hits>
        <Hit>
          <Hit_id>gi|7|ref|NM_7.1|</Hit_id>
          <Hit_def>test hit</Hit_def>
          <Hit_accession>NM_7</Hit_accession>
          <Hit_len>500</Hit_len>
          <Hit_hsps>
            <Hsp>
              <Hsp_score>8</Hsp_score>
              <Hsp_evalue>0.01</Hsp_evalue>
              <Hsp_qseq>ACGTACGT</Hsp_qseq>
              <Hsp_hseq>ACGTACGT</Hsp_hseq>
              <Hsp_midline>||||||||</Hsp_midline>
            </Hsp>
          </Hit_hsps>
        </Hit>
      </Iteration_hits>
    </Iteration>
  </BlastOutput_iterations>
</BlastOutput>
"#;

    fn local_client(base_url: String) -> BlastClient {
        BlastClient::new(BlastConfig {
            base_url,
            poll_interval: Duration::ZERO,
            email: "someone@example.org".into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn info_block(lines: &str) -> String {
        format!("<!--QBlastInfoBegin\n{lines}\nQBlastInfoEnd\n-->")
    }

    #[test]
    fn qblast_submits_polls_and_fetches() {
        let (base, server) = serve(vec![
            (200, info_block("    RID = R42\n    RTOE = 0")),
            (200, info_block("    Status=WAITING")),
            (200, info_block("    Status=READY\n    ThereAreHits=yes")),
            (200, ONE_HIT_XML.to_string()),
        ]);
        let client = local_client(format!("{base}/Blast.cgi"));
        let matches = client.search("ACGTACGT").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].accession, "NM_7");
        assert_eq!(matches[0].title, "gi|7|ref|NM_7.1| test hit");
        assert_eq!(matches[0].hsps[0].midline, "||||||||");

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].line.starts_with("POST /Blast.cgi"));
        for field in ["CMD=Put", "PROGRAM=blastn", "DATABASE=nt", "QUERY=ACGTACGT", "HITLIST_SIZE=50"] {
            assert!(seen[0].body.contains(field), "{field} missing from {}", seen[0].body);
        }
        assert!(seen[1].line.contains("FORMAT_OBJECT=SearchInfo") && seen[1].line.contains("RID=R42"));
        assert!(seen[2].line.contains("FORMAT_OBJECT=SearchInfo"));
        assert!(seen[3].line.contains("FORMAT_TYPE=XML") && seen[3].line.contains("RID=R42"));
    }

    #[test]
    fn server_side_failure_is_not_a_network_failure() {
        let (base, server) = serve(vec![
            (200, info_block("    RID = R9\n    RTOE = 0")),
            (200, info_block("    Status=FAILED")),
        ]);
        let outcome: SearchOutcome = local_client(base).search("ACGT").into();
        assert!(matches!(outcome, SearchOutcome::OtherFailure(ref m) if m.contains("R9")));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_reports_the_reason() {
        let outcome: SearchOutcome = local_client(closed_port_url("/Blast.cgi")).search("ACGT").into();
        match outcome {
            SearchOutcome::NetworkFailure(reason) => assert!(!reason.is_empty()),
            other => panic!("expected a network failure, got {other:?}"),
        }
    }

    #[test]
    fn get_url_appends_tool() {
        let client = BlastClient::new(BlastConfig::default()).unwrap();
        let url = client.get_url(&[("CMD", "Get"), ("RID", "R1")]);
        let q: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(q[0], ("CMD".into(), "Get".into()));
        assert!(q.contains(&("tool".into(), "seqprobe".into())));
    }
}
