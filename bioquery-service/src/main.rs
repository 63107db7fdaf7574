use std::path::PathBuf;

use agent_flow::{Agent, AgentSettings, ConversationFactory, rig_conversation_factory};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use bioquery_service::answers::{AnswerRecord, AnswerStore};
use bioquery_service::integrations::{
    BLAST_INTEGRATION, BlastFetcher, BlastInterpreter, BlastQueryBuilder, ONCOKB_INTEGRATION,
    OncoKbFetcher, OncoKbInterpreter, OncoKbQueryBuilder,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const ASSISTANT_PREAMBLE: &str =
    "You are a bioinformatics assistant answering questions about sequences and cancer mutations.";

#[derive(Clone)]
struct AppState {
    answers: AnswerStore,
    conversation_factory: ConversationFactory,
    results_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    integration: Integration,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Integration {
    #[default]
    Blast,
    Oncokb,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    question_id: Uuid,
    answer: Option<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bioquery_service=debug,agent_flow=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let results_dir =
        std::env::var("BIOQUERY_RESULTS_DIR").unwrap_or_else(|_| "results".to_string());

    let app_state = AppState {
        answers: AnswerStore::new(),
        conversation_factory: rig_conversation_factory(ASSISTANT_PREAMBLE),
        results_dir: PathBuf::from(results_dir),
    };

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .route("/answers/{id}", get(get_answer))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    info!("Server running on http://0.0.0.0:3000");

    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> &'static str {
    "OK"
}

/// Run one question/answer cycle against the chosen integration.
///
/// A fresh agent is built per request: the orchestration is intentionally
/// single-query-at-a-time, and per-request construction keeps execution
/// state from leaking between questions.
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, StatusCode> {
    info!("Ask request: {:?}", request);

    let record = match request.integration {
        Integration::Blast => {
            let settings = AgentSettings::new(state.results_dir.join("blast"));
            let mut agent = Agent::new(
                BlastQueryBuilder,
                BlastFetcher::new(),
                BlastInterpreter,
                state.conversation_factory.clone(),
                settings,
            );
            agent.execute(&request.question).await;
            state.answers.record(
                BLAST_INTEGRATION,
                &request.question,
                agent.final_answer.take(),
                agent.error.as_ref(),
            )
        }
        Integration::Oncokb => {
            let settings = AgentSettings::new(state.results_dir.join("oncokb"));
            let mut agent = Agent::new(
                OncoKbQueryBuilder,
                OncoKbFetcher::new(),
                OncoKbInterpreter,
                state.conversation_factory.clone(),
                settings,
            );
            agent.execute(&request.question).await;
            state.answers.record(
                ONCOKB_INTEGRATION,
                &request.question,
                agent.final_answer.take(),
                agent.error.as_ref(),
            )
        }
    };

    Ok(Json(AskResponse {
        question_id: record.id,
        answer: record.answer,
        error: record.error,
    }))
}

async fn get_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnswerRecord>, StatusCode> {
    state.answers.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}
