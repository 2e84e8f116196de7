use std::cell::Cell;

use seqprobe::pipeline::{run, PipelineConfig};
use seqprobe::*;

const SEQ: &str = "ATGGCCATTGTAATGGGCCGCTGAAAGGGTGCCCGATAG";

struct FixedSource;

impl SequenceSource for FixedSource {
    fn fetch(&self, accession: &str) -> Result<SequenceRecord, SeqprobeError> {
        Ok(SequenceRecord::new(accession, format!("{accession} test record"), SEQ))
    }
}

struct FailingSource;

impl SequenceSource for FailingSource {
    fn fetch(&self, _accession: &str) -> Result<SequenceRecord, SeqprobeError> {
        Err(SeqprobeError::Network { reason: "connection reset".into() })
    }
}

enum Behaviour {
    Hits(usize),
    NetworkDown,
    ServerFailed,
}

struct FakeSearch {
    behaviour: Behaviour,
    calls: Cell<usize>,
}

impl FakeSearch {
    fn new(behaviour: Behaviour) -> Self {
        Self { behaviour, calls: Cell::new(0) }
    }
}

fn hit(n: usize) -> SimilarityMatch {
    SimilarityMatch {
        title: format!("gi|{n}|ref|HIT_{n}| hit number {n}"),
        accession: format!("HIT_{n}"),
        length: 1000 + n,
        hsps: vec![Hsp {
            score: 78.0,
            bit_score: 72.1,
            expect: 2e-10,
            identities: 39,
            align_len: 39,
            query_range: (1, 39),
            subject_range: (11, 49),
            query: SEQ.to_string(),
            midline: "|".repeat(SEQ.len()),
            subject: SEQ.to_string(),
        }],
    }
}

impl SimilaritySearch for FakeSearch {
    fn search(&self, sequence: &str) -> Result<Vec<SimilarityMatch>, SeqprobeError> {
        self.calls.set(self.calls.get() + 1);
        assert_eq!(sequence, SEQ);
        match self.behaviour {
            Behaviour::Hits(n) => Ok((1..=n).map(hit).collect()),
            Behaviour::NetworkDown => Err(SeqprobeError::Network { reason: "Name or service not known".into() }),
            Behaviour::ServerFailed => Err(SeqprobeError::Blast("search R1 failed on the server".into())),
        }
    }
}

fn report(search: &FakeSearch, config: &PipelineConfig) -> (Result<PipelineRun, SeqprobeError>, String) {
    let mut out = Vec::new();
    let res = run(config, &FixedSource, search, &mut out);
    (res, String::from_utf8(out).unwrap())
}

fn assert_earlier_stages(text: &str) {
    assert!(text.contains("--- Fetching Nucleotide Sequence ---"));
    assert!(text.contains("Accession: NM_001301717\n"));
    assert!(text.contains("Description: NM_001301717 test record\n"));
    assert!(text.contains(&format!("Sequence length: {}\n", SEQ.len())));
    assert!(text.contains("Translation (RNA → Protein): MAIVMGR\n"));
    assert!(text.contains("GC Content: 56.41 %\n"));
    assert!(text.contains("--- Global Alignment ---\nScore: 39.0\n"));
    assert!(text.contains("--- Local Alignment ---\nScore: 39.0\n"));
}

#[test]
fn only_the_top_three_hits_are_reported() {
    let search = FakeSearch::new(Behaviour::Hits(5));
    let (res, text) = report(&search, &PipelineConfig::default());
    let run = res.unwrap();
    assert_earlier_stages(&text);
    assert!(text.contains("--- Running BLASTn on database nt ---"));
    assert!(text.contains("Top 3 Alignments for BLASTn:"));
    assert_eq!(text.matches("\nSequence: ").count(), 3);
    assert_eq!(text.matches("Score: 78.0, E-value: 2.00e-10\n").count(), 3);
    assert_eq!(text.matches("\nSubject: ").count(), 3);
    assert!(text.contains("HIT_3") && !text.contains("HIT_4"));
    assert_eq!(run.reported_matches(3).len(), 3);
    assert_eq!(search.calls.get(), 1);
}

#[test]
fn network_failure_is_reported_not_raised() {
    let search = FakeSearch::new(Behaviour::NetworkDown);
    let (res, text) = report(&search, &PipelineConfig::default());
    let run = res.unwrap();
    assert_earlier_stages(&text);
    assert!(text.ends_with("URL Error: Name or service not known\n"));
    assert_eq!(run.search, Some(SearchOutcome::NetworkFailure("Name or service not known".into())));
    assert!(run.reported_matches(3).is_empty());
}

#[test]
fn other_failures_are_reported_generically() {
    let search = FakeSearch::new(Behaviour::ServerFailed);
    let (res, text) = report(&search, &PipelineConfig::default());
    assert!(res.is_ok());
    assert_earlier_stages(&text);
    assert!(text.ends_with("An error occurred: BLAST search failed: search R1 failed on the server\n"));
}

#[test]
fn analysis_section_matches_the_record() {
    let search = FakeSearch::new(Behaviour::Hits(0));
    let (res, text) = report(&search, &PipelineConfig::default());
    let run = res.unwrap();
    assert!(text.contains(&format!("Original Sequence: {SEQ}\n")));
    assert!(text.contains(&format!("Complement: {}\n", complement(SEQ))));
    assert!(text.contains(&format!("Reverse Complement: {}\n", reverse_complement(SEQ))));
    assert!(text.contains(&format!("Transcription (DNA → RNA): {}\n", transcribe(SEQ))));
    assert_eq!(run.global.aligned_target, SEQ);
    assert_eq!(run.local.aligned_query, SEQ);
    assert!(text.ends_with("Top 3 Alignments for BLASTn:\n"));
}

#[test]
fn skipped_search_never_calls_the_service() {
    let search = FakeSearch::new(Behaviour::Hits(5));
    let config = PipelineConfig { skip_search: true, ..Default::default() };
    let (res, text) = report(&search, &config);
    assert!(res.unwrap().search.is_none());
    assert_eq!(search.calls.get(), 0);
    assert!(!text.contains("Running BLAST"));
}

#[test]
fn fetch_failure_propagates() {
    let search = FakeSearch::new(Behaviour::Hits(1));
    let mut out = Vec::new();
    let err = run(&PipelineConfig::default(), &FailingSource, &search, &mut out).unwrap_err();
    assert_eq!(err.network_reason(), Some("connection reset"));
    assert_eq!(search.calls.get(), 0);
    assert!(!String::from_utf8(out).unwrap().contains("Sequence Analysis"));
}
