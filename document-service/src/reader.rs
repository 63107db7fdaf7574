use std::io::Cursor;
use std::path::Path;

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use pdf2image::{PDF, Pages};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::models::Document;

const OCR_MODEL: &str = "openai/gpt-4.1-mini";

/// Loads documents from disk or raw bytes.
///
/// Plain text is read directly; PDF pages are rendered to images and
/// transcribed through the language model's vision endpoint.
pub struct DocumentReader;

impl DocumentReader {
    /// Load a document from a path, dispatching on the file extension.
    pub async fn load_document(&self, path: &Path) -> anyhow::Result<Vec<Document>> {
        let bytes = tokio::fs::read(path).await?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("pdf") => self.document_from_pdf(bytes).await,
            _ => self.document_from_txt(&bytes),
        }
    }

    /// Build a document from plain-text bytes.
    pub fn document_from_txt(&self, bytes: &[u8]) -> anyhow::Result<Vec<Document>> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| anyhow!("document is not valid UTF-8: {}", e))?;
        Ok(vec![Document::new(text)])
    }

    /// Build a document from PDF bytes via page rendering and LLM OCR.
    pub async fn document_from_pdf(&self, bytes: Vec<u8>) -> anyhow::Result<Vec<Document>> {
        let images = render_pdf_pages(bytes).await?;
        if images.is_empty() {
            return Err(anyhow!("no pages rendered from PDF"));
        }
        info!("Rendered {} pages from PDF", images.len());

        let text = extract_text_with_llm_vision(&images).await?;
        Ok(vec![Document::new(text)])
    }
}

/// Render every PDF page to an image on a blocking thread.
async fn render_pdf_pages(bytes: Vec<u8>) -> anyhow::Result<Vec<DynamicImage>> {
    let images = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<DynamicImage>> {
        let pdf = PDF::from_bytes(bytes).map_err(|e| anyhow!("Failed to load PDF: {}", e))?;
        let rendered = pdf
            .render(Pages::All, None)
            .map_err(|e| anyhow!("Failed to render PDF pages: {}", e))?;
        Ok(rendered)
    })
    .await??;
    Ok(images)
}

/// Use LLM vision to extract text from page images in a single call.
async fn extract_text_with_llm_vision(images: &[DynamicImage]) -> anyhow::Result<String> {
    info!(
        "Processing {} pages with LLM vision OCR in single call",
        images.len()
    );

    let mut content = vec![json!({
        "type": "text",
        "text": format!(
            "You are an expert document OCR system. I'm providing you with {} pages of a document. \
             Extract ALL text from these pages with perfect accuracy, preserving the structure and \
             terminology of the original.\n\n\
             For each page, start with '=== Page X ===' as a header, then provide the extracted text. \
             Maintain the document's logical flow across pages.\n\n\
             Return ONLY the extracted text without any commentary or explanations.",
            images.len()
        )
    })];
    for (i, image) in images.iter().enumerate() {
        let base64_image = image_to_base64(image)?;
        content.push(json!({
            "type": "image_url",
            "image_url": {
                "url": format!("data:image/png;base64,{}", base64_image)
            }
        }));
        info!("Converted page {} to base64", i + 1);
    }

    let extracted_text = call_openrouter_api(OCR_MODEL, content, 4000).await?;

    info!(
        "LLM vision OCR completed: {} total characters extracted",
        extracted_text.len()
    );
    Ok(extracted_text)
}

/// Convert an image to base64 for the LLM vision API.
fn image_to_base64(image: &DynamicImage) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| anyhow!("Failed to encode image: {}", e))?;

    Ok(STANDARD.encode(&buffer))
}

/// Call the OpenRouter chat completions API with vision/text content.
async fn call_openrouter_api(
    model: &str,
    content: Vec<Value>,
    max_tokens: u32,
) -> anyhow::Result<String> {
    let api_key = std::env::var("OPENROUTER_API_KEY")
        .map_err(|_| anyhow!("OPENROUTER_API_KEY environment variable not set"))?;

    let client = Client::new();

    let payload = json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": content
            }
        ],
        "max_tokens": max_tokens
    });

    let response = client
        .post("https://openrouter.ai/api/v1/chat/completions")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("LLM API request failed: {}", response.status()));
    }

    let response_json: Value = response.json().await?;

    let content = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| anyhow!("Invalid response format from LLM"))?;

    Ok(content.to_string())
}
