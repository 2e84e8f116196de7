//! NCBI E-utilities `efetch` client.
//!
//! One blocking GET per record. NCBI asks every caller to identify itself
//! with a `tool` name and a contact `email`; an `api_key` raises the rate
//! limit from 3 to 10 requests per second.
//!
//! ```rust,no_run
//! use seqprobe::{EntrezClient, EntrezConfig};
//! let client = EntrezClient::new(EntrezConfig { email: "me@example.org".into(), ..Default::default() }).unwrap();
//! let rec = client.fetch_fasta("NM_001301717").unwrap();
//! println!("{} {}", rec.id, rec.len());
//! ```
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::Url;

use crate::common::{read_single_fasta, SeqprobeError, SequenceRecord, SequenceSource};

pub const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Settings for [`EntrezClient`].
#[derive(Clone, Debug)]
pub struct EntrezConfig {
    /// efetch endpoint.
    pub base_url: String,
    /// Contact address required by the NCBI usage policy.
    pub email: String,
    pub tool: String,
    pub api_key: Option<String>,
    /// Database queried by [`SequenceSource::fetch`].
    pub db: String,
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            base_url: EFETCH_URL.to_string(),
            email: String::new(),
            tool: env!("CARGO_PKG_NAME").to_string(),
            api_key: None,
            db: "nucleotide".to_string(),
        }
    }
}

pub struct EntrezClient {
    config: EntrezConfig,
    base: Url,
    http: Client,
}

impl EntrezClient {
    pub fn new(config: EntrezConfig) -> Result<Self, SeqprobeError> {
        let base = parse_url(&config.base_url)?;
        let http = build_http_client()?;
        Ok(Self { config, base, http })
    }

    /// The full efetch request URL, including the identity parameters.
    pub fn efetch_url(&self, db: &str, id: &str, rettype: &str, retmode: &str) -> Url {
        let mut url = self.base.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("db", db)
                .append_pair("id", id)
                .append_pair("rettype", rettype)
                .append_pair("retmode", retmode)
                .append_pair("tool", &self.config.tool);
            if !self.config.email.is_empty() {
                q.append_pair("email", &self.config.email);
            }
            if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
                q.append_pair("api_key", key);
            }
        }
        url
    }

    /// Run one efetch request and return the response body.
    pub fn efetch(&self, db: &str, id: &str, rettype: &str, retmode: &str) -> Result<String, SeqprobeError> {
        let url = self.efetch_url(db, id, rettype, retmode);
        info!("efetch {id} from {db} ({rettype}/{retmode})");
        debug!("GET {url}");
        let body = self.http.get(url).send()?.error_for_status()?.text()?;
        debug!("efetch returned {} bytes", body.len());
        Ok(body)
    }

    /// Fetch exactly one FASTA record for `accession`.
    pub fn fetch_fasta(&self, accession: &str) -> Result<SequenceRecord, SeqprobeError> {
        let body = self.efetch(&self.config.db, accession, "fasta", "text")?;
        read_single_fasta(&body).map_err(|e| match e {
            SeqprobeError::InvalidFasta(msg) => {
                let first = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("<empty response>");
                SeqprobeError::InvalidFasta(format!("{msg} for {accession} (response starts with: {})", first.trim()))
            }
            other => other,
        })
    }
}

impl SequenceSource for EntrezClient {
    fn fetch(&self, accession: &str) -> Result<SequenceRecord, SeqprobeError> {
        self.fetch_fasta(accession)
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, SeqprobeError> {
    Url::parse(raw).map_err(|e| SeqprobeError::InvalidUrl { url: raw.to_string(), reason: e.to_string() })
}

/// Blocking client without a request timeout; a hung request hangs the run.
pub(crate) fn build_http_client() -> Result<Client, SeqprobeError> {
    Ok(Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(None)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::loopback::{closed_port_url, serve};

    fn client(api_key: Option<&str>) -> EntrezClient {
        EntrezClient::new(EntrezConfig {
            email: "someone@example.org".into(),
            api_key: api_key.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn efetch_url_carries_identity() {
        let url = client(None).efetch_url("nucleotide", "NM_001301717", "fasta", "text");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(url.as_str().starts_with(EFETCH_URL));
        assert!(pairs.contains(&("db".into(), "nucleotide".into())));
        assert!(pairs.contains(&("id".into(), "NM_001301717".into())));
        assert!(pairs.contains(&("rettype".into(), "fasta".into())));
        assert!(pairs.contains(&("email".into(), "someone@example.org".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "api_key"));
    }

    #[test]
    fn efetch_url_with_api_key() {
        let url = client(Some("abc123")).efetch_url("nucleotide", "X", "fasta", "text");
        assert!(url.query_pairs().any(|(k, v)| k == "api_key" && v == "abc123"));
    }

    fn local_client(base_url: String) -> EntrezClient {
        EntrezClient::new(EntrezConfig { base_url, email: "someone@example.org".into(), ..Default::default() }).unwrap()
    }

    #[test]
    fn fetch_fasta_reads_the_reply() {
        let (base, server) = serve(vec![(200, ">NM_5.1 test gene\nacgt\nGG\n".into())]);
        let rec = local_client(format!("{base}/efetch.fcgi")).fetch_fasta("NM_5").unwrap();
        assert_eq!(rec.id, "NM_5.1");
        assert_eq!(rec.seq, "ACGTGG");
        let seen = server.join().unwrap();
        assert!(seen[0].line.starts_with("GET /efetch.fcgi?db=nucleotide&id=NM_5&rettype=fasta"));
        assert!(seen[0].line.contains("tool=seqprobe"));
    }

    #[test]
    fn error_reply_is_not_parsed() {
        let (base, server) = serve(vec![(200, "Error: ID list is empty\n".into())]);
        let err = local_client(base).fetch_fasta("nothing").unwrap_err();
        assert!(err.to_string().contains("Error: ID list is empty"));
        server.join().unwrap();
    }

    #[test]
    fn http_status_failure_is_a_network_error() {
        let (base, server) = serve(vec![(500, "boom".into())]);
        let err = local_client(base).fetch_fasta("NM_5").unwrap_err();
        assert!(err.network_reason().is_some_and(|r| r.contains("500")));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        let err = local_client(closed_port_url("/efetch.fcgi")).fetch("NM_5").unwrap_err();
        assert!(matches!(err, SeqprobeError::Network { ref reason } if !reason.is_empty()));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let cfg = EntrezConfig { base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(EntrezClient::new(cfg), Err(SeqprobeError::InvalidUrl { .. })));
    }
}
