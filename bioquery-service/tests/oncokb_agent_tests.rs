use agent_flow::{AgentError, Conversation, Fetcher, QueryBuilder, SubmissionHandle};
use async_trait::async_trait;
use bioquery_service::integrations::{OncoKbFetcher, OncoKbQueryBuilder, OncoKbQueryParameters};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct ScriptedConversation {
    reply: String,
}

#[async_trait]
impl Conversation for ScriptedConversation {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }
}

fn braf_query() -> OncoKbQueryParameters {
    OncoKbQueryParameters {
        endpoint: "annotate/mutations/byProteinChange".to_string(),
        hugo_symbol: "BRAF".to_string(),
        alteration: Some("V600E".to_string()),
        tumor_type: Some("Melanoma".to_string()),
        question_uuid: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn generate_query_extracts_annotation_parameters() {
    let conversation = ScriptedConversation {
        reply: r#"{"hugoSymbol": "BRAF", "alteration": "V600E", "tumorType": "Melanoma"}"#
            .to_string(),
    };

    let query = OncoKbQueryBuilder
        .generate_query(
            "What is the annotation for the mutation BRAF V600E in Melanoma?",
            &conversation,
        )
        .await
        .unwrap();

    assert_eq!(query.hugo_symbol, "BRAF");
    assert_eq!(query.alteration.as_deref(), Some("V600E"));
    assert_eq!(query.tumor_type.as_deref(), Some("Melanoma"));
    assert_eq!(query.endpoint, "annotate/mutations/byProteinChange");
}

#[tokio::test]
async fn generate_query_rejects_output_without_gene() {
    let conversation = ScriptedConversation {
        reply: r#"{"alteration": "V600E"}"#.to_string(),
    };
    let err = OncoKbQueryBuilder
        .generate_query("What about V600E?", &conversation)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SchemaExtraction(_)));
}

#[tokio::test]
async fn submit_query_returns_response_url_as_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/annotate/mutations/byProteinChange"))
        .and(query_param("hugoSymbol", "BRAF"))
        .and(query_param("alteration", "V600E"))
        .and(query_param("tumorType", "Melanoma"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let fetcher = OncoKbFetcher::new().with_base_url(server.uri());
    let handle = fetcher.submit_query(&braf_query()).await.unwrap();

    assert!(handle.as_str().starts_with(&server.uri()));
    assert!(handle.as_str().contains("hugoSymbol=BRAF"));
    assert!(handle.as_str().contains("alteration=V600E"));
    assert!(handle.as_str().contains("tumorType=Melanoma"));
}

#[tokio::test]
async fn submit_query_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = OncoKbFetcher::new().with_base_url(server.uri());
    let err = fetcher.submit_query(&braf_query()).await.unwrap_err();
    assert!(matches!(err, AgentError::Submission(_)));
}

#[tokio::test]
async fn fetch_and_save_writes_oncokb_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/annotate/mutations/byProteinChange"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Mock OncoKB results"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let question_uuid = Uuid::new_v4();
    let handle = SubmissionHandle::new(format!(
        "{}/annotate/mutations/byProteinChange?hugoSymbol=BRAF&alteration=V600E&tumorType=Melanoma",
        server.uri()
    ));

    let fetcher = OncoKbFetcher::new().with_base_url(server.uri());
    let file_name = fetcher
        .fetch_and_save_results(question_uuid, &handle, dir.path(), 100)
        .await
        .unwrap();

    assert_eq!(file_name, format!("OncoKB_results_{question_uuid}.oncokb"));
    let saved = std::fs::read_to_string(dir.path().join(&file_name)).unwrap();
    assert_eq!(saved, "Mock OncoKB results");
}

#[tokio::test]
async fn fetch_and_save_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let handle = SubmissionHandle::new(format!("{}/annotate/mutations/byProteinChange", server.uri()));

    let fetcher = OncoKbFetcher::new().with_base_url(server.uri());
    let err = fetcher
        .fetch_and_save_results(Uuid::new_v4(), &handle, dir.path(), 100)
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Fetch(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn submit_query_omits_missing_optional_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/annotate/mutations/byProteinChange"))
        .and(query_param("hugoSymbol", "TP53"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let query = OncoKbQueryParameters {
        endpoint: "annotate/mutations/byProteinChange".to_string(),
        hugo_symbol: "TP53".to_string(),
        alteration: None,
        tumor_type: None,
        question_uuid: Uuid::new_v4(),
    };

    let fetcher = OncoKbFetcher::new().with_base_url(server.uri());
    let handle = fetcher.submit_query(&query).await.unwrap();
    assert!(!handle.as_str().contains("alteration"));
    assert!(!handle.as_str().contains("tumorType"));
}
