use std::path::Path;
use std::time::Duration;

use agent_flow::{
    AgentError, ApiQuery, Conversation, ConversationFactory, Fetcher, Interpreter, Poller, Probe,
    QueryBuilder, Result, SubmissionHandle, extract_structured, read_first_n_lines,
    results_file_name, save_results,
};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

pub const BLAST_INTEGRATION: &str = "BLAST";

const BLAST_URL: &str = "https://blast.ncbi.nlm.nih.gov/Blast.cgi";
const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(30);

const BLAST_EXTRACTION_INSTRUCTION: &str = r#"Extract the parameters of an NCBI BLAST search from the user's question.
Fields:
- "query": the nucleotide or protein sequence to search with (required)
- "program": "blastn" for nucleotide sequences, "blastp" for protein sequences
- "database": "nt" for nucleotide searches, "nr" for protein searches
- "max_hits": number of hits to return, if the user asked for a specific count
Answer with a JSON object containing these fields."#;

/// Parameters accepted by the NCBI BLAST URL API.
///
/// The model only extracts the question-dependent fields; everything else
/// defaults to a plain megablast nucleotide search against `nt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastQueryParameters {
    #[serde(default = "default_cmd")]
    pub cmd: String,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Sequence to search with.
    pub query: String,
    #[serde(default = "default_format_type")]
    pub format_type: String,
    #[serde(default = "default_megablast")]
    pub megablast: bool,
    #[serde(default = "default_max_hits")]
    pub max_hits: u32,
    /// Submission endpoint. Status checks and result retrieval go through
    /// the fetcher's own base URL.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "Uuid::new_v4")]
    pub question_uuid: Uuid,
}

fn default_cmd() -> String {
    "Put".to_string()
}

fn default_program() -> String {
    "blastn".to_string()
}

fn default_database() -> String {
    "nt".to_string()
}

fn default_format_type() -> String {
    "Text".to_string()
}

fn default_megablast() -> bool {
    true
}

fn default_max_hits() -> u32 {
    15
}

fn default_url() -> String {
    BLAST_URL.to_string()
}

impl ApiQuery for BlastQueryParameters {
    fn question_uuid(&self) -> Uuid {
        self.question_uuid
    }
}

/// Builds BLAST queries from free-text questions via structured extraction.
pub struct BlastQueryBuilder;

#[async_trait]
impl QueryBuilder for BlastQueryBuilder {
    type Query = BlastQueryParameters;

    async fn generate_query(
        &self,
        question: &str,
        conversation: &dyn Conversation,
    ) -> Result<BlastQueryParameters> {
        let query: BlastQueryParameters =
            extract_structured(conversation, BLAST_EXTRACTION_INSTRUCTION, question).await?;
        if query.query.trim().is_empty() {
            return Err(AgentError::SchemaExtraction(
                "extracted BLAST query has an empty sequence".to_string(),
            ));
        }
        Ok(query)
    }
}

/// Submits BLAST searches and retrieves results via RID polling.
pub struct BlastFetcher {
    client: reqwest::Client,
    base_url: String,
    poll_delay: Duration,
}

impl BlastFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BLAST_URL.to_string(),
            poll_delay: DEFAULT_POLL_DELAY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_delay(mut self, poll_delay: Duration) -> Self {
        self.poll_delay = poll_delay;
        self
    }

    async fn check_status(&self, rid: &str) -> anyhow::Result<Probe> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("CMD", "Get"), ("FORMAT_OBJECT", "SearchInfo"), ("RID", rid)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(Probe::Failed(format!(
                "status check returned {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        Ok(classify_status(&body, rid))
    }

    async fn fetch_results(&self, rid: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("CMD", "Get"), ("FORMAT_TYPE", "Text"), ("RID", rid)])
            .send()
            .await
            .map_err(|e| AgentError::Fetch(format!("results request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AgentError::Fetch(format!(
                "results request returned {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| AgentError::Fetch(format!("results body unreadable: {e}")))
    }
}

impl Default for BlastFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for BlastFetcher {
    type Query = BlastQueryParameters;

    async fn submit_query(&self, query: &BlastQueryParameters) -> Result<SubmissionHandle> {
        let form = [
            ("CMD", query.cmd.clone()),
            ("PROGRAM", query.program.clone()),
            ("DATABASE", query.database.clone()),
            ("QUERY", query.query.clone()),
            ("FORMAT_TYPE", query.format_type.clone()),
            (
                "MEGABLAST",
                if query.megablast { "on" } else { "off" }.to_string(),
            ),
            ("HITLIST_SIZE", query.max_hits.to_string()),
        ];
        let response = self
            .client
            .post(&query.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AgentError::Submission(format!("submission request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AgentError::Submission(format!(
                "submission returned {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Submission(format!("submission body unreadable: {e}")))?;
        let rid = parse_rid(&body).ok_or_else(|| {
            AgentError::Submission("no RID marker in submission response".to_string())
        })?;
        info!(rid, "BLAST query submitted");
        Ok(SubmissionHandle::new(rid))
    }

    async fn fetch_and_save_results(
        &self,
        question_uuid: Uuid,
        handle: &SubmissionHandle,
        save_path: &Path,
        max_attempts: u32,
    ) -> Result<String> {
        let rid = handle.as_str();
        let poller = Poller::new(max_attempts, self.poll_delay);
        poller
            .run(|attempt| {
                debug!(attempt, rid, "checking BLAST status");
                self.check_status(rid)
            })
            .await?;

        let body = self.fetch_results(rid).await?;
        let file_name = results_file_name(BLAST_INTEGRATION, question_uuid, "txt");
        save_results(save_path, &file_name, &body).await?;
        info!(%question_uuid, file_name, "BLAST results saved");
        Ok(file_name)
    }
}

/// Pull the `RID = <id>` marker out of a submission response body.
fn parse_rid(body: &str) -> Option<String> {
    let re = Regex::new(r"RID\s*=\s*(\S+)").expect("invalid regex");
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Map a status response body onto a polling probe outcome.
/// A READY status without hits is still ready; an empty hit list is a
/// summarization concern, not a fetch failure.
fn classify_status(body: &str, rid: &str) -> Probe {
    if body.contains("Status=READY") {
        Probe::Ready
    } else if body.contains("Status=WAITING") {
        Probe::NotReady
    } else if body.contains("Status=FAILED") {
        Probe::Failed(format!("BLAST search {rid} failed on the server"))
    } else if body.contains("Status=UNKNOWN") {
        Probe::Failed(format!("RID {rid} expired or unknown"))
    } else {
        Probe::NotReady
    }
}

/// Summarizes raw BLAST report text into a natural-language answer.
pub struct BlastInterpreter;

#[async_trait]
impl Interpreter for BlastInterpreter {
    async fn summarise_answer(
        &self,
        question: &str,
        conversation_factory: ConversationFactory,
        file_path: &Path,
        n_lines: usize,
    ) -> Result<String> {
        let excerpt = read_first_n_lines(file_path, n_lines).await?;
        let conversation = conversation_factory()
            .map_err(|e| AgentError::Interpretation(format!("conversation setup failed: {e}")))?;
        let prompt = format!(
            "You are a bioinformatician reading a BLAST search report.\n\
             Answer the user's question based only on the report excerpt below.\n\n\
             Question: {question}\n\n\
             BLAST report excerpt:\n{excerpt}\n\n\
             Answer:"
        );
        conversation
            .complete(&prompt)
            .await
            .map_err(|e| AgentError::Interpretation(format!("summarization call failed: {e}")))
    }
}
