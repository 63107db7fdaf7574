use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::{completion::Prompt, providers::openrouter};

use crate::conversation::{Conversation, ConversationFactory};

/// Default OpenRouter model, overridable via `BIOQUERY_MODEL`.
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Conversation backed by a rig OpenRouter agent.
pub struct RigConversation {
    agent: rig::agent::Agent<openrouter::CompletionModel>,
}

impl RigConversation {
    pub fn new(preamble: &str) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
        let model =
            std::env::var("BIOQUERY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let client = openrouter::Client::new(&api_key);
        let agent = client.agent(&model).preamble(preamble).build();
        Ok(Self { agent })
    }
}

#[async_trait]
impl Conversation for RigConversation {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.agent.prompt(prompt).await?)
    }
}

/// Factory producing a fresh rig conversation per call.
pub fn rig_conversation_factory(preamble: &'static str) -> ConversationFactory {
    Arc::new(move || Ok(Arc::new(RigConversation::new(preamble)?) as Arc<dyn Conversation>))
}
