//! Weaviate chunk store.
//!
//! Talks to Weaviate over its REST/GraphQL API:
//! - `POST /v1/graphql` for hybrid search
//! - `GET /v1/.well-known/ready` for readiness
//!
//! Each chunk object is expected to expose `title`, `chunk` and
//! `chunk_number` properties.

use crate::store::ChunkStore;
use crate::types::{ChunkRecord, HybridSearch};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wikiqa_core::config::StoreConfig;
use wikiqa_core::{AppError, AppResult, Phase};

/// Properties requested for every hit.
const RETURN_FIELDS: &str = "title chunk chunk_number _additional { distance score }";

#[derive(Debug, Serialize)]
struct GraphQlRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// One object as returned under `data.Get.<Collection>`.
#[derive(Debug, Deserialize)]
struct ChunkObject {
    title: String,
    chunk: String,
    chunk_number: i64,
    #[serde(rename = "_additional", default)]
    additional: Option<Additional>,
}

#[derive(Debug, Deserialize)]
struct Additional {
    #[serde(default)]
    distance: Option<f32>,
    /// Weaviate reports hybrid scores as strings
    #[serde(default)]
    score: Option<Value>,
}

impl Additional {
    /// Relevance distance for a hit.
    ///
    /// Hybrid queries usually only carry a fused `score` (higher is better),
    /// in which case the distance is reported as `1 - score`.
    fn relevance_distance(&self) -> Option<f32> {
        if let Some(distance) = self.distance {
            return Some(distance);
        }

        let score = match self.score.as_ref()? {
            Value::String(s) => s.parse::<f32>().ok()?,
            Value::Number(n) => n.as_f64()? as f32,
            _ => return None,
        };
        Some(1.0 - score)
    }
}

/// Weaviate-backed chunk store.
pub struct WeaviateStore {
    base_url: String,
    collection: String,
    api_key: Option<String>,
    alpha: Option<f32>,
    client: reqwest::Client,
}

impl WeaviateStore {
    /// Create a store handle without contacting the server.
    ///
    /// Fails with `AppError::Config` if the collection name is not a valid
    /// GraphQL class name.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        validate_collection(&config.collection)?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key: config.resolve_api_key(),
            alpha: config.alpha,
            client: reqwest::Client::new(),
        })
    }

    /// Create a store handle and check that the server is ready.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let store = Self::new(config)?;
        store.ping().await?;
        tracing::info!(
            endpoint = %store.base_url,
            collection = %store.collection,
            "Connected to Weaviate"
        );
        Ok(store)
    }

    /// Build the GraphQL hybrid query.
    fn build_query(&self, search: &HybridSearch) -> AppResult<String> {
        // A JSON string literal is also a valid GraphQL string literal
        let query_literal = serde_json::to_string(&search.query)?;
        let alpha = self
            .alpha
            .map(|a| format!(", alpha: {}", a))
            .unwrap_or_default();

        Ok(format!(
            "{{ Get {{ {collection}(hybrid: {{query: {query}{alpha}}}, limit: {limit}) {{ {fields} }} }} }}",
            collection = self.collection,
            query = query_literal,
            alpha = alpha,
            limit = search.limit,
            fields = RETURN_FIELDS,
        ))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Extract chunk records from a GraphQL response body.
    fn parse_response(&self, response: GraphQlResponse) -> AppResult<Vec<ChunkRecord>> {
        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(AppError::Retrieval(format!(
                "Weaviate query failed: {}",
                messages.join("; ")
            )));
        }

        let objects = response
            .data
            .as_ref()
            .and_then(|data| data.get("Get"))
            .and_then(|get| get.get(&self.collection))
            .cloned()
            .ok_or_else(|| {
                AppError::Retrieval(format!(
                    "Weaviate response has no results for collection '{}'",
                    self.collection
                ))
            })?;

        if objects.is_null() {
            return Ok(Vec::new());
        }

        let objects: Vec<ChunkObject> = serde_json::from_value(objects).map_err(|e| {
            AppError::Retrieval(format!(
                "Collection '{}' returned malformed chunk objects: {}",
                self.collection, e
            ))
        })?;

        objects
            .into_iter()
            .map(|object| {
                let relevance_distance = object
                    .additional
                    .as_ref()
                    .and_then(Additional::relevance_distance)
                    .ok_or_else(|| {
                        AppError::Retrieval(format!(
                            "Chunk {} of '{}' has no distance or score",
                            object.chunk_number, object.title
                        ))
                    })?;

                Ok(ChunkRecord {
                    title: object.title,
                    chunk_text: object.chunk,
                    chunk_number: object.chunk_number,
                    relevance_distance,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ChunkStore for WeaviateStore {
    fn backend_name(&self) -> &str {
        "weaviate"
    }

    async fn hybrid_search(&self, search: &HybridSearch) -> AppResult<Vec<ChunkRecord>> {
        let query = self.build_query(search)?;
        let url = format!("{}/v1/graphql", self.base_url);

        tracing::debug!(collection = %self.collection, limit = search.limit, "Sending hybrid query");

        let response = self
            .request(self.client.post(&url))
            .json(&GraphQlRequest { query })
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, error_text));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Weaviate response: {}", e)))?;

        let records = self.parse_response(body)?;
        tracing::debug!(hits = records.len(), "Hybrid query returned");
        Ok(records)
    }

    async fn ping(&self) -> AppResult<()> {
        let url = format!("{}/v1/.well-known/ready", self.base_url);

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::connection(
                Phase::Retrieval,
                format!("Weaviate at {} is not ready ({})", self.base_url, status),
            ));
        }

        Ok(())
    }
}

/// Collection names are interpolated into GraphQL, so only class-name
/// characters are accepted.
fn validate_collection(collection: &str) -> AppResult<()> {
    let mut chars = collection.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Invalid collection name: '{}'",
            collection
        )))
    }
}

fn map_send_error(err: reqwest::Error) -> AppError {
    if err.is_connect() || err.is_timeout() {
        AppError::connection(Phase::Retrieval, format!("Weaviate is unreachable: {}", err))
    } else {
        AppError::Retrieval(format!("Failed to send request to Weaviate: {}", err))
    }
}

fn classify_status(status: StatusCode, error_text: String) -> AppError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        AppError::connection(
            Phase::Retrieval,
            format!("Weaviate rejected credentials ({}): {}", status, error_text),
        )
    } else {
        AppError::Retrieval(format!("Weaviate API error ({}): {}", status, error_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(endpoint: &str) -> WeaviateStore {
        let config = StoreConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        };
        WeaviateStore::new(&config).unwrap()
    }

    fn search(query: &str, limit: u32) -> HybridSearch {
        HybridSearch {
            query: query.to_string(),
            limit,
        }
    }

    #[test]
    fn test_build_query() {
        let store = store_for("http://localhost:8080");
        let query = store.build_query(&search("When is the election?", 2)).unwrap();

        assert_eq!(
            query,
            "{ Get { WikiChunk(hybrid: {query: \"When is the election?\"}, limit: 2) { title chunk chunk_number _additional { distance score } } } }"
        );
    }

    #[test]
    fn test_build_query_escapes_text_and_adds_alpha() {
        let config = StoreConfig {
            alpha: Some(0.25),
            ..Default::default()
        };
        let store = WeaviateStore::new(&config).unwrap();
        let query = store
            .build_query(&search("say \"hi\"\n} injected {", 1))
            .unwrap();

        assert!(query.contains(r#"query: "say \"hi\"\n} injected {", alpha: 0.25"#));
    }

    #[test]
    fn test_invalid_collection_rejected() {
        for name in ["", "1Wiki", "Wiki Chunk", "Wiki){"] {
            let config = StoreConfig {
                collection: name.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(WeaviateStore::new(&config), Err(AppError::Config(_))),
                "expected '{}' to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_distance_falls_back_to_score() {
        let additional = Additional {
            distance: None,
            score: Some(serde_json::json!("0.75")),
        };
        assert_eq!(additional.relevance_distance(), Some(0.25));

        let additional = Additional {
            distance: Some(0.12),
            score: Some(serde_json::json!("0.9")),
        };
        assert_eq!(additional.relevance_distance(), Some(0.12));

        let additional = Additional {
            distance: None,
            score: None,
        };
        assert_eq!(additional.relevance_distance(), None);
    }

    #[tokio::test]
    async fn test_hybrid_search_preserves_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(body_string_contains("limit: 2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Get": { "WikiChunk": [
                    {
                        "title": "2024 US Election",
                        "chunk": "...held November 5, 2024...",
                        "chunk_number": 3,
                        "_additional": { "distance": 0.12, "score": null }
                    },
                    {
                        "title": "Election Day",
                        "chunk": "...federal election day...",
                        "chunk_number": 1,
                        "_additional": { "distance": 0.30, "score": null }
                    }
                ] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server.uri());
        let records = store
            .hybrid_search(&search("When is the election?", 2))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "2024 US Election");
        assert_eq!(records[0].chunk_number, 3);
        assert_eq!(records[0].relevance_distance, 0.12);
        assert_eq!(records[1].title, "Election Day");
        assert_eq!(records[1].chunk_text, "...federal election day...");
    }

    #[tokio::test]
    async fn test_fused_scores_keep_relevance_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Get": { "WikiChunk": [
                    {
                        "title": "2024 US Election",
                        "chunk": "a",
                        "chunk_number": 3,
                        "_additional": { "distance": null, "score": "0.016393442" }
                    },
                    {
                        "title": "Election Day",
                        "chunk": "b",
                        "chunk_number": 1,
                        "_additional": { "distance": null, "score": "0.016129032" }
                    }
                ] } }
            })))
            .mount(&server)
            .await;

        let records = store_for(&server.uri())
            .hybrid_search(&search("When is the election?", 2))
            .await
            .unwrap();

        assert_eq!(records[0].title, "2024 US Election");
        assert!(records[0].relevance_distance < records[1].relevance_distance);
        assert!(records.iter().all(|r| r.relevance_distance > 0.98));
    }

    #[tokio::test]
    async fn test_empty_collection_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Get": { "WikiChunk": [] } }
            })))
            .mount(&server)
            .await;

        let records = store_for(&server.uri())
            .hybrid_search(&search("anything", 3))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_are_retrieval_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Get": { "WikiChunk": null } },
                "errors": [ { "message": "Cannot query field \"chunk_number\" on type \"WikiChunk\"." } ]
            })))
            .mount(&server)
            .await;

        let err = store_for(&server.uri())
            .hybrid_search(&search("anything", 3))
            .await
            .unwrap_err();

        match err {
            AppError::Retrieval(msg) => assert!(msg.contains("chunk_number")),
            other => panic!("expected retrieval error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_objects_are_retrieval_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "Get": { "WikiChunk": [ { "title": "No chunk text" } ] } }
            })))
            .mount(&server)
            .await;

        let err = store_for(&server.uri())
            .hybrid_search(&search("anything", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_connection_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/graphql"))
            .and(header("authorization", "Bearer wrong-key"))
            .respond_with(ResponseTemplate::new(401).set_body_string("anonymous access not enabled"))
            .mount(&server)
            .await;

        let store = WeaviateStore {
            api_key: Some("wrong-key".to_string()),
            ..store_for(&server.uri())
        };
        let err = store
            .hybrid_search(&search("anything", 3))
            .await
            .unwrap_err();

        assert!(err.is_connection());
        assert_eq!(err.phase(), Some(Phase::Retrieval));
    }

    #[tokio::test]
    async fn test_connect_checks_readiness() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = StoreConfig {
            endpoint: server.uri(),
            ..Default::default()
        };
        match WeaviateStore::connect(&config).await {
            Err(err) => assert!(err.is_connection()),
            Ok(_) => panic!("expected readiness failure"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_is_connection_error() {
        let err = store_for("http://127.0.0.1:9")
            .hybrid_search(&search("anything", 3))
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }
}
