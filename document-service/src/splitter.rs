use unicode_segmentation::UnicodeSegmentation;

use crate::models::Document;

/// Splits documents into ordered, overlapping chunks.
///
/// Chunks are sized either by character count or by word-token count
/// (unicode word segmentation); consecutive chunks share `chunk_overlap`
/// units so no boundary context is lost.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub split_by_tokens: bool,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
            split_by_tokens: false,
        }
    }
}

impl ChunkSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize, split_by_tokens: bool) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            split_by_tokens,
        }
    }

    /// Split every document into chunks, preserving order.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|document| self.split_text(&document.page_content))
            .map(Document::new)
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if self.split_by_tokens {
            self.split_by_token_count(text)
        } else {
            self.split_by_char_count(text)
        }
    }

    fn split_by_char_count(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.step();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        chunks
    }

    fn split_by_token_count(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.unicode_words().collect();
        let step = self.step();
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }
        chunks
    }

    // step of 0 would never advance
    fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_characters_with_overlap() {
        let splitter = ChunkSplitter::new(100, 10, false);
        let text = "x".repeat(250);
        let chunks = splitter.split_text(&text);

        // windows start at 0, 90, 180
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks[2].chars().count(), 70);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let splitter = ChunkSplitter::new(10, 4, false);
        let text: String = ('a'..='z').collect();
        let chunks = splitter.split_text(&text);

        for pair in chunks.windows(2) {
            let count = pair[0].chars().count();
            let tail: String = pair[0].chars().skip(count - 4).collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_split_respects_multibyte_characters() {
        let splitter = ChunkSplitter::new(5, 0, false);
        let text = "αβγδεζηθικ";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks, vec!["αβγδε".to_string(), "ζηθικ".to_string()]);
    }

    #[test]
    fn test_split_by_tokens_with_overlap() {
        let splitter = ChunkSplitter::new(4, 1, true);
        let text = "one two three four five six seven eight";
        let chunks = splitter.split_text(text);

        assert_eq!(chunks[0], "one two three four");
        assert_eq!(chunks[1], "four five six seven");
        assert_eq!(chunks[2], "seven eight");
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = ChunkSplitter::new(100, 10, false);
        let chunks = splitter.split_text("short");
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let splitter = ChunkSplitter::default();
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn test_split_documents_preserves_order() {
        let splitter = ChunkSplitter::new(3, 0, true);
        let documents = vec![
            Document::new("one two three four"),
            Document::new("five six"),
        ];
        let chunks = splitter.split_documents(&documents);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page_content, "one two three");
        assert_eq!(chunks[1].page_content, "four");
        assert_eq!(chunks[2].page_content, "five six");
    }
}
