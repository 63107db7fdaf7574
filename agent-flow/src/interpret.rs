use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncBufReadExt;

use crate::{
    conversation::ConversationFactory,
    error::{AgentError, Result},
};

/// Role that reads a result artifact and asks the language model for a
/// natural-language answer to the original question.
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Summarise the result artifact at `file_path`.
    ///
    /// At most `n_lines` lines are forwarded to the model to bound token
    /// usage. A low-confidence answer is still an answer; only a missing
    /// or unreadable artifact, or a failed model call, is an error.
    async fn summarise_answer(
        &self,
        question: &str,
        conversation_factory: ConversationFactory,
        file_path: &Path,
        n_lines: usize,
    ) -> Result<String>;
}

/// Read at most `n_lines` lines from a result artifact.
pub async fn read_first_n_lines(file_path: &Path, n_lines: usize) -> Result<String> {
    let file = tokio::fs::File::open(file_path).await.map_err(|e| {
        AgentError::Interpretation(format!("cannot open {}: {e}", file_path.display()))
    })?;
    let mut lines = tokio::io::BufReader::new(file).lines();
    let mut collected = Vec::new();
    while collected.len() < n_lines {
        let line = lines.next_line().await.map_err(|e| {
            AgentError::Interpretation(format!("cannot read {}: {e}", file_path.display()))
        })?;
        match line {
            Some(line) => collected.push(line),
            None => break,
        }
    }
    Ok(collected.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_first_n_lines_bounds_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "line1\nline2\nline3\nline4\nline5\n").unwrap();

        let excerpt = read_first_n_lines(&path, 3).await.unwrap();
        assert_eq!(excerpt, "line1\nline2\nline3");
    }

    #[tokio::test]
    async fn test_read_first_n_lines_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.txt");
        std::fs::write(&path, "only line\n").unwrap();

        let excerpt = read_first_n_lines(&path, 100).await.unwrap();
        assert_eq!(excerpt, "only line");
    }

    #[tokio::test]
    async fn test_read_first_n_lines_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_first_n_lines(&dir.path().join("absent.txt"), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Interpretation(_)));
    }
}
