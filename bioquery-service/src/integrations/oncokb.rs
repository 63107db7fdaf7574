use std::path::Path;

use agent_flow::{
    AgentError, ApiQuery, Conversation, ConversationFactory, Fetcher, Interpreter, QueryBuilder,
    Result, SubmissionHandle, extract_structured, read_first_n_lines, results_file_name,
    save_results,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub const ONCOKB_INTEGRATION: &str = "OncoKB";

const ONCOKB_BASE_URL: &str = "https://demo.oncokb.org/api/v1";

const ONCOKB_EXTRACTION_INSTRUCTION: &str = r#"Extract the parameters of an OncoKB mutation annotation lookup from the user's question.
Fields:
- "hugoSymbol": the HUGO gene symbol, e.g. "BRAF" (required)
- "alteration": the protein change, e.g. "V600E"
- "tumorType": the tumor type, e.g. "Melanoma"
Answer with a JSON object containing these fields."#;

/// Parameters accepted by the OncoKB annotation API. Field names follow
/// the service's own camelCase query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OncoKbQueryParameters {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub hugo_symbol: String,
    pub alteration: Option<String>,
    pub tumor_type: Option<String>,
    #[serde(default = "Uuid::new_v4")]
    pub question_uuid: Uuid,
}

fn default_endpoint() -> String {
    "annotate/mutations/byProteinChange".to_string()
}

impl ApiQuery for OncoKbQueryParameters {
    fn question_uuid(&self) -> Uuid {
        self.question_uuid
    }
}

/// Builds OncoKB annotation queries from free-text questions.
pub struct OncoKbQueryBuilder;

#[async_trait]
impl QueryBuilder for OncoKbQueryBuilder {
    type Query = OncoKbQueryParameters;

    async fn generate_query(
        &self,
        question: &str,
        conversation: &dyn Conversation,
    ) -> Result<OncoKbQueryParameters> {
        let query: OncoKbQueryParameters =
            extract_structured(conversation, ONCOKB_EXTRACTION_INSTRUCTION, question).await?;
        if query.hugo_symbol.trim().is_empty() {
            return Err(AgentError::SchemaExtraction(
                "extracted OncoKB query has an empty gene symbol".to_string(),
            ));
        }
        Ok(query)
    }
}

/// Fetches OncoKB annotations. The service answers synchronously, so the
/// submission response's URL doubles as the result handle and no polling
/// is involved.
pub struct OncoKbFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl OncoKbFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: ONCOKB_BASE_URL.to_string(),
            token: std::env::var("ONCOKB_TOKEN").ok(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl Default for OncoKbFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for OncoKbFetcher {
    type Query = OncoKbQueryParameters;

    async fn submit_query(&self, query: &OncoKbQueryParameters) -> Result<SubmissionHandle> {
        let mut params: Vec<(&str, String)> = vec![("hugoSymbol", query.hugo_symbol.clone())];
        if let Some(alteration) = &query.alteration {
            params.push(("alteration", alteration.clone()));
        }
        if let Some(tumor_type) = &query.tumor_type {
            params.push(("tumorType", tumor_type.clone()));
        }

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            query.endpoint.trim_start_matches('/')
        );
        let response = self
            .request(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AgentError::Submission(format!("submission request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AgentError::Submission(format!(
                "submission returned {}",
                response.status()
            )));
        }
        info!(url = %response.url(), "OncoKB query submitted");
        Ok(SubmissionHandle::new(response.url().to_string()))
    }

    async fn fetch_and_save_results(
        &self,
        question_uuid: Uuid,
        handle: &SubmissionHandle,
        save_path: &Path,
        _max_attempts: u32,
    ) -> Result<String> {
        // synchronous service, a single fetch suffices
        let response = self
            .request(handle.as_str())
            .send()
            .await
            .map_err(|e| AgentError::Fetch(format!("results request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AgentError::Fetch(format!(
                "results request returned {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Fetch(format!("results body unreadable: {e}")))?;

        let file_name = results_file_name(ONCOKB_INTEGRATION, question_uuid, "oncokb");
        save_results(save_path, &file_name, &body).await?;
        info!(%question_uuid, file_name, "OncoKB results saved");
        Ok(file_name)
    }
}

/// Summarizes an OncoKB annotation payload into a natural-language answer.
pub struct OncoKbInterpreter;

#[async_trait]
impl Interpreter for OncoKbInterpreter {
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
            "You are an oncologist reading a clinical mutation annotation from OncoKB.\n\
             The annotation below is JSON returned by the OncoKB API.\n\
             Answer the user's question based only on this annotation.\n\n\
             Question: {question}\n\n\
             OncoKB annotation:\n{excerpt}\n\n\
             Answer:"
        );
        conversation
            .complete(&prompt)
            .await
            .map_err(|e| AgentError::Interpretation(format!("summarization call failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_camel_case_fields() {
        let query: OncoKbQueryParameters = serde_json::from_str(
            r#"{"hugoSymbol": "BRAF", "alteration": "V600E", "tumorType": "Melanoma"}"#,
        )
        .unwrap();
        assert_eq!(query.hugo_symbol, "BRAF");
        assert_eq!(query.alteration.as_deref(), Some("V600E"));
        assert_eq!(query.tumor_type.as_deref(), Some("Melanoma"));
        assert_eq!(query.endpoint, "annotate/mutations/byProteinChange");
    }

    #[test]
    fn test_missing_gene_symbol_fails_deserialization() {
        let parsed =
            serde_json::from_str::<OncoKbQueryParameters>(r#"{"alteration": "V600E"}"#);
        assert!(parsed.is_err());
    }
}
