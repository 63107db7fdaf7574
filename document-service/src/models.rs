use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A loaded document, or one chunk of a split document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestDocumentRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct IngestDocumentResponse {
    pub document_id: String,
    pub chunks_stored: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SearchHit {
    pub content: String,
    pub distance: f64,
}
