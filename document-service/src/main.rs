use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use document_service::{
    ChunkSplitter, DocumentReader, EmbeddingService, VectorStore,
    models::{
        IngestDocumentRequest, IngestDocumentResponse, SearchRequest, SearchResponse,
    },
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
struct AppState {
    reader: Arc<DocumentReader>,
    splitter: ChunkSplitter,
    embeddings: Arc<EmbeddingService>,
    store: Arc<VectorStore>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "document_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");
    let store = VectorStore::connect(&database_url).await.unwrap_or_else(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::process::exit(1);
    });

    let chunk_size = env_usize("DOC_CHUNK_SIZE", 1000);
    let chunk_overlap = env_usize("DOC_CHUNK_OVERLAP", 0);
    let split_by_tokens = std::env::var("DOC_SPLIT_BY_TOKENS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let app_state = AppState {
        reader: Arc::new(DocumentReader),
        splitter: ChunkSplitter::new(chunk_size, chunk_overlap, split_by_tokens),
        embeddings: Arc::new(EmbeddingService),
        store: Arc::new(store),
    };

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/documents", post(ingest_document))
        .route("/search", post(search))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await.unwrap();

    info!("Server running on http://0.0.0.0:3001");

    axum::serve(listener, app).await.unwrap();
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Load a document, split it, embed every chunk and store the embeddings.
async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestDocumentRequest>,
) -> ApiResult<IngestDocumentResponse> {
    info!("Ingest request for {}", request.path);

    let documents = state
        .reader
        .load_document(Path::new(&request.path))
        .await
        .map_err(|e| internal_error("failed to load document", &e.to_string()))?;

    let chunks = state.splitter.split_documents(&documents);
    if chunks.is_empty() {
        return Err(bad_request_error("document produced no chunks"));
    }

    let texts: Vec<String> = chunks
        .iter()
        .map(|chunk| chunk.page_content.clone())
        .collect();
    let embeddings = state
        .embeddings
        .embed(texts)
        .await
        .map_err(|e| internal_error("embedding generation failed", &e.to_string()))?;

    let document_id = Uuid::new_v4();
    for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
        state
            .store
            .store_chunk(document_id, &chunk.page_content, embedding)
            .await
            .map_err(|e| internal_error("failed to store chunk", &e.to_string()))?;
    }

    info!(%document_id, chunks = chunks.len(), "document ingested");

    Ok(Json(IngestDocumentResponse {
        document_id: document_id.to_string(),
        chunks_stored: chunks.len(),
    }))
}

/// Embed the query text and return the nearest stored chunks.
async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    info!("Search request: {}", request.query);

    let embedding = state
        .embeddings
        .embed_query(&request.query)
        .await
        .map_err(|e| internal_error("embedding generation failed", &e.to_string()))?;

    let results = state
        .store
        .similarity_search(&embedding, request.top_k)
        .await
        .map_err(|e| internal_error("similarity search failed", &e.to_string()))?;

    Ok(Json(SearchResponse { results }))
}
