use thiserror::Error;

/// Errors produced by the stages of one question/answer cycle.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The language model did not produce a schema-conformant query object.
    #[error("Schema extraction failed: {0}")]
    SchemaExtraction(String),

    /// The external service rejected the submission or returned a response
    /// without the expected handle marker.
    #[error("Query submission failed: {0}")]
    Submission(String),

    /// The bounded polling loop exhausted its attempts before the service
    /// reported readiness.
    #[error("Polling timed out after {attempts} attempts")]
    PollingTimeout { attempts: u32 },

    /// A status check or result retrieval returned a non-success response.
    #[error("Result fetch failed: {0}")]
    Fetch(String),

    /// The result artifact was missing or unreadable, or the summarization
    /// call failed.
    #[error("Result interpretation failed: {0}")]
    Interpretation(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// Pipeline stages, named so a recorded failure identifies where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildQuery,
    Submit,
    Fetch,
    Interpret,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::BuildQuery => "query building",
            Stage::Submit => "submission",
            Stage::Fetch => "fetching",
            Stage::Interpret => "interpretation",
        };
        write!(f, "{name}")
    }
}

/// A stage failure recorded by the agent instead of being propagated.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: AgentError,
}

impl StageFailure {
    pub fn new(stage: Stage, source: AgentError) -> Self {
        Self { stage, source }
    }
}
