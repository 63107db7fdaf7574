use std::path::PathBuf;

use tracing::{error, info};

use crate::{
    conversation::ConversationFactory,
    error::{AgentError, Stage, StageFailure},
    fetch::Fetcher,
    interpret::Interpreter,
    query::{ApiQuery, QueryBuilder},
};

/// Tunables for one agent instance.
///
/// The polling bound, excerpt bound and their defaults are inherited
/// configuration, not contractual constants.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Directory the fetcher writes result artifacts into.
    pub save_path: PathBuf,
    /// Upper bound on readiness probes per query.
    pub max_attempts: u32,
    /// Upper bound on result lines forwarded to the model.
    pub n_lines: usize,
}

impl AgentSettings {
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            max_attempts: 10_000,
            n_lines: 100,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_n_lines(mut self, n_lines: usize) -> Self {
        self.n_lines = n_lines;
        self
    }
}

/// Orchestrates one question/answer cycle over a single API integration.
///
/// Runs QueryBuilder → Fetcher → Interpreter sequentially and never
/// propagates stage errors: after [`execute`](Self::execute) returns,
/// callers inspect `final_answer` and `error`. Retry is confined to the
/// fetcher's internal polling; a failure at any stage discards all work
/// for that question. One question at a time per instance.
pub struct Agent<B, F, I>
where
    B: QueryBuilder,
    F: Fetcher<Query = B::Query>,
    I: Interpreter,
{
    builder: B,
    fetcher: F,
    interpreter: I,
    conversation_factory: ConversationFactory,
    settings: AgentSettings,
    pub final_answer: Option<String>,
    pub error: Option<StageFailure>,
}

impl<B, F, I> Agent<B, F, I>
where
    B: QueryBuilder,
    F: Fetcher<Query = B::Query>,
    I: Interpreter,
{
    pub fn new(
        builder: B,
        fetcher: F,
        interpreter: I,
        conversation_factory: ConversationFactory,
        settings: AgentSettings,
    ) -> Self {
        Self {
            builder,
            fetcher,
            interpreter,
            conversation_factory,
            settings,
            final_answer: None,
            error: None,
        }
    }

    /// Run one full cycle for `question`. Failures are recorded, not raised.
    pub async fn execute(&mut self, question: &str) {
        self.final_answer = None;
        self.error = None;

        if let Err(failure) = self.run_stages(question).await {
            error!("{failure}");
            self.error = Some(failure);
        }
    }

    async fn run_stages(&mut self, question: &str) -> std::result::Result<(), StageFailure> {
        let conversation = (self.conversation_factory)().map_err(|e| {
            StageFailure::new(
                Stage::BuildQuery,
                AgentError::SchemaExtraction(format!("conversation setup failed: {e}")),
            )
        })?;

        let query = self
            .builder
            .generate_query(question, conversation.as_ref())
            .await
            .map_err(|e| StageFailure::new(Stage::BuildQuery, e))?;
        let question_uuid = query.question_uuid();
        info!(%question_uuid, "query generated");

        let handle = self
            .fetcher
            .submit_query(&query)
            .await
            .map_err(|e| StageFailure::new(Stage::Submit, e))?;
        info!(%question_uuid, handle = handle.as_str(), "query submitted");

        let file_name = self
            .fetcher
            .fetch_and_save_results(
                question_uuid,
                &handle,
                &self.settings.save_path,
                self.settings.max_attempts,
            )
            .await
            .map_err(|e| StageFailure::new(Stage::Fetch, e))?;
        info!(%question_uuid, file_name, "results saved");

        let file_path = self.settings.save_path.join(&file_name);
        let answer = self
            .interpreter
            .summarise_answer(
                question,
                self.conversation_factory.clone(),
                &file_path,
                self.settings.n_lines,
            )
            .await
            .map_err(|e| StageFailure::new(Stage::Interpret, e))?;

        self.final_answer = Some(answer);
        Ok(())
    }
}
