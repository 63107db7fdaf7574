use tracing::info;

/// Generates text embeddings with a local fastembed model.
pub struct EmbeddingService;

impl EmbeddingService {
    /// Embed a batch of chunk texts.
    pub async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        info!("Generating embeddings for {} texts", texts.len());

        // Off-load the potentially expensive ONNX inference to a blocking
        // thread so we don't obstruct Tokio's async scheduler.
        let embeddings = tokio::task::spawn_blocking(move || {
            use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(true),
            )?;
            let embeddings = model.embed(texts, None)?;
            Ok::<Vec<Vec<f32>>, anyhow::Error>(embeddings)
        })
        .await??;

        Ok(embeddings)
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut embeddings = self.embed(vec![text.to_owned()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding model returned no vectors"))
    }
}
