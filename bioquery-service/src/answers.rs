use std::sync::Arc;

use agent_flow::StageFailure;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// One completed question/answer cycle.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub integration: String,
    pub question: String,
    pub answer: Option<String>,
    pub error: Option<String>,
    pub answered_at: DateTime<Utc>,
}

/// In-memory log of answered questions, keyed by record id.
#[derive(Clone, Default)]
pub struct AnswerStore {
    records: Arc<DashMap<Uuid, AnswerRecord>>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }

    pub fn record(
        &self,
        integration: &str,
        question: &str,
        answer: Option<String>,
        error: Option<&StageFailure>,
    ) -> AnswerRecord {
        let record = AnswerRecord {
            id: Uuid::new_v4(),
            integration: integration.to_string(),
            question: question.to_string(),
            answer,
            error: error.map(|failure| failure.to_string()),
            answered_at: Utc::now(),
        };
        self.records.insert(record.id, record.clone());
        record
    }

    pub fn get(&self, id: &Uuid) -> Option<AnswerRecord> {
        self.records.get(id).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_flow::{AgentError, Stage};

    #[test]
    fn test_record_and_lookup() {
        let store = AnswerStore::new();
        let record = store.record("BLAST", "what is this", Some("an answer".to_string()), None);

        let found = store.get(&record.id).unwrap();
        assert_eq!(found.integration, "BLAST");
        assert_eq!(found.answer.as_deref(), Some("an answer"));
        assert!(found.error.is_none());
    }

    #[test]
    fn test_record_keeps_stage_failure_description() {
        let store = AnswerStore::new();
        let failure = StageFailure::new(Stage::Fetch, AgentError::PollingTimeout { attempts: 10 });
        let record = store.record("BLAST", "what is this", None, Some(&failure));

        let found = store.get(&record.id).unwrap();
        assert!(found.answer.is_none());
        assert!(found.error.unwrap().contains("fetching"));
    }

    #[test]
    fn test_unknown_id_is_none() {
        let store = AnswerStore::new();
        assert!(store.get(&Uuid::new_v4()).is_none());
    }
}
