use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AgentError, Result},
    query::ApiQuery,
};

/// Opaque token returned by the external service on submission: a request
/// id for polling services, a result URL for synchronous ones. Created on
/// submit, consumed by the matching fetch, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role that submits a structured query to an external service and
/// retrieves its results, polling for readiness where the service requires
/// it.
#[async_trait]
pub trait Fetcher: Send + Sync {
    type Query: ApiQuery;

    /// Register the query with the external service and return its handle.
    async fn submit_query(&self, query: &Self::Query) -> Result<SubmissionHandle>;

    /// Wait for the service to finish, then write the raw result body
    /// verbatim under `save_path`. Returns the generated file name (not the
    /// full path) so callers compose paths consistently.
    async fn fetch_and_save_results(
        &self,
        question_uuid: Uuid,
        handle: &SubmissionHandle,
        save_path: &Path,
        max_attempts: u32,
    ) -> Result<String>;
}

/// File name of a result artifact: `<Integration>_results_<uuid>.<ext>`.
pub fn results_file_name(integration: &str, question_uuid: Uuid, extension: &str) -> String {
    format!("{integration}_results_{question_uuid}.{extension}")
}

/// Write a result body verbatim, creating the directory if needed.
/// Artifacts are written once per uuid and never rewritten in place.
pub async fn save_results(save_path: &Path, file_name: &str, body: &str) -> Result<()> {
    tokio::fs::create_dir_all(save_path).await.map_err(|e| {
        AgentError::Fetch(format!("cannot create {}: {e}", save_path.display()))
    })?;
    let path = save_path.join(file_name);
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| AgentError::Fetch(format!("cannot write {}: {e}", path.display())))
}
