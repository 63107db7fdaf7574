use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AgentError, Result};

/// System instruction shared by all structured extraction calls.
pub const EXTRACTION_PREAMBLE: &str =
    "You are a world class algorithm for extracting information in structured formats.";

/// A language model session capable of free-text completion.
///
/// Implementations wrap whatever provider is in use; everything in this
/// crate only ever sees the trait, so tests substitute scripted fakes.
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Produces a fresh conversation per call. Passed explicitly into the roles
/// that need one rather than held as ambient state.
pub type ConversationFactory =
    Arc<dyn Fn() -> anyhow::Result<Arc<dyn Conversation>> + Send + Sync>;

/// Ask the model to populate `T` from free text.
///
/// The reply is expected to carry a single JSON object; anything the model
/// wraps around it is ignored. A missing object or a field mismatch is a
/// [`AgentError::SchemaExtraction`] failure, never a silent coercion.
pub async fn extract_structured<T: DeserializeOwned>(
    conversation: &dyn Conversation,
    instruction: &str,
    input: &str,
) -> Result<T> {
    let prompt = format!(
        "{EXTRACTION_PREAMBLE}\n\n{instruction}\n\n\
         Use the given format to extract information from the following input: {input}\n\
         Tip: Make sure to answer in the correct format. Return only the JSON object, nothing else."
    );

    let response = conversation
        .complete(&prompt)
        .await
        .map_err(|e| AgentError::SchemaExtraction(format!("model call failed: {e}")))?;

    debug!("structured extraction response: {}", response);

    let json_str = json_object_in(&response).ok_or_else(|| {
        AgentError::SchemaExtraction("no JSON object found in model response".to_string())
    })?;

    serde_json::from_str(json_str)
        .map_err(|e| AgentError::SchemaExtraction(format!("response did not match schema: {e}")))
}

/// Locate the outermost JSON object embedded in a completion.
fn json_object_in(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end >= start).then(|| &response[start..=end])
}
