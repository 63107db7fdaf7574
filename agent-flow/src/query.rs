use async_trait::async_trait;
use uuid::Uuid;

use crate::{conversation::Conversation, error::Result};

/// A structured, schema-validated query against one external API.
///
/// Immutable after creation. The identifier assigned at creation correlates
/// the question with its eventual result artifact.
pub trait ApiQuery: Send + Sync {
    fn question_uuid(&self) -> Uuid;
}

/// Role that turns a natural-language question into a structured API query.
#[async_trait]
pub trait QueryBuilder: Send + Sync {
    type Query: ApiQuery;

    /// Extract a populated query object for the target API from `question`.
    ///
    /// Uses the conversation's structured-output path only; the network call
    /// to the target service itself belongs to the fetcher.
    async fn generate_query(
        &self,
        question: &str,
        conversation: &dyn Conversation,
    ) -> Result<Self::Query>;
}
