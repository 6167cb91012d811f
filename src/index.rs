//! Index chunk fetcher.
//!
//! Queries the search service for every chunk whose semantic identifier
//! matches a document name, and decodes the answer into an
//! [`IndexQueryResult`].
//!
//! # Request
//!
//! One `POST` to the configured search endpoint with URL-form fields:
//!
//! | Field | Value |
//! |-------|-------|
//! | `yql` | `select * from sources <schema> where <field> contains @semantic_id;` |
//! | `semantic_id` | the identifier, verbatim |
//! | `hits` | result cap |
//! | `format` | `json` |
//!
//! The identifier reaches the query only through YQL parameter substitution,
//! so quotes or query-language syntax inside a document name match literally
//! instead of rewriting the filter.
//!
//! `contains` is only an exact match when `<field>` is an attribute (the
//! default `semantic_identifier` is one). Pointed at an indexed text field it
//! matches tokens, so `report.pdf` could also hit `report.pdf (copy)`; the
//! gap and count checks then see chunks from more than one document.
//!
//! # Response
//!
//! ```json
//! { "root": {
//!     "fields": { "totalCount": 3 },
//!     "errors": [ { "code": 4, "summary": "...", "message": "..." } ],
//!     "children": [ { "fields": { "chunk_id": 0, "content": "...", ... } } ]
//! } }
//! ```
//!
//! A non-empty `errors` array is returned as [`IndexQueryResult::Errors`];
//! deciding what to do about it is the analyzer's job.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::IndexConfig;
use crate::error::{AuditError, AuditResult};
use crate::models::{ChunkRecord, IndexError, IndexQueryResult};

/// Name of the request parameter carrying the semantic identifier.
pub const SEMANTIC_ID_PARAM: &str = "semantic_id";

/// A decoded index answer together with the body it came from.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub result: IndexQueryResult,
    /// Parsed response body, kept for the on-disk artifact.
    pub raw: Value,
}

/// HTTP client for the index service.
pub struct IndexClient {
    client: reqwest::Client,
    config: IndexConfig,
}

impl IndexClient {
    pub fn new(config: IndexConfig) -> AuditResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// The YQL sent for every fetch. Contains no caller data.
    pub fn yql(&self) -> String {
        format!(
            "select * from sources {} where {} contains @{};",
            self.config.schema, self.config.field, SEMANTIC_ID_PARAM
        )
    }

    /// Form fields for one fetch.
    pub fn request_params(&self, semantic_id: &str, hits: u32) -> Vec<(&'static str, String)> {
        vec![
            ("yql", self.yql()),
            (SEMANTIC_ID_PARAM, semantic_id.to_string()),
            ("hits", hits.to_string()),
            ("format", "json".to_string()),
        ]
    }

    /// Fetch all chunks for `semantic_id`, capped at the configured hit
    /// count.
    pub async fn fetch_chunks(&self, semantic_id: &str) -> AuditResult<FetchOutcome> {
        self.fetch_chunks_with_hits(semantic_id, self.config.hits).await
    }

    /// Fetch all chunks for `semantic_id`, capped at `hits` records.
    ///
    /// # Errors
    ///
    /// - [`AuditError::Transport`] if the service is unreachable or answers
    ///   with a status other than 2xx that carries no decodable error list.
    /// - [`AuditError::Decode`] if the body is not the expected JSON.
    pub async fn fetch_chunks_with_hits(
        &self,
        semantic_id: &str,
        hits: u32,
    ) -> AuditResult<FetchOutcome> {
        tracing::debug!(
            endpoint = %self.config.endpoint,
            semantic_id,
            hits,
            "querying index"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .form(&self.request_params(semantic_id, hits))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // The service answers invalid queries with 4xx plus an error list;
        // keep those as ordinary outcomes.
        match decode_response(&body) {
            Ok(outcome) => {
                if !status.is_success() && !matches!(outcome.result, IndexQueryResult::Errors(_))
                {
                    return Err(AuditError::Transport(format!(
                        "index: {} returned {}",
                        self.config.endpoint, status
                    )));
                }
                Ok(outcome)
            }
            Err(_) if !status.is_success() => Err(AuditError::Transport(format!(
                "index: {} returned {}",
                self.config.endpoint, status
            ))),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    root: ResponseRoot,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseRoot {
    #[serde(default)]
    fields: RootFields,
    #[serde(default)]
    errors: Vec<IndexError>,
    #[serde(default)]
    children: Vec<Hit>,
}

#[derive(Debug, Default, Deserialize)]
struct RootFields {
    #[serde(rename = "totalCount")]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Decode an index response body.
///
/// Children without a `chunk_id` are not chunks of any document and are
/// dropped with a warning. They still count toward `returned`, so a skipped
/// child never looks like a result cut short by the hit cap.
pub fn decode_response(body: &str) -> AuditResult<FetchOutcome> {
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| AuditError::decode(format!("response is not JSON: {}", e), body))?;
    let parsed: ResponseBody = serde_json::from_value(raw.clone())
        .map_err(|e| AuditError::decode(format!("unexpected response shape: {}", e), body))?;

    let root = parsed.root;
    if !root.errors.is_empty() {
        return Ok(FetchOutcome {
            result: IndexQueryResult::Errors(root.errors),
            raw,
        });
    }

    let returned = root.children.len() as u64;
    let total_count = root.fields.total_count.unwrap_or(returned);

    let mut chunks = Vec::with_capacity(root.children.len());
    for (position, hit) in root.children.into_iter().enumerate() {
        if hit.fields.get("chunk_id").map_or(true, Value::is_null) {
            tracing::warn!(position, "index hit has no chunk_id, skipping");
            continue;
        }
        let chunk: ChunkRecord = serde_json::from_value(Value::Object(hit.fields))
            .map_err(|e| AuditError::decode(format!("hit {}: {}", position, e), body))?;
        chunks.push(chunk);
    }

    Ok(FetchOutcome {
        result: IndexQueryResult::Chunks {
            chunks,
            returned,
            total_count,
        },
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> IndexClient {
        IndexClient::new(IndexConfig::default()).unwrap()
    }

    #[test]
    fn test_yql_uses_parameter_not_identifier() {
        let c = client();
        let params = c.request_params(r#"evil" or true or "x"#, 50);
        let yql = &params.iter().find(|(k, _)| *k == "yql").unwrap().1;
        assert_eq!(
            yql,
            "select * from sources danswer_index where semantic_identifier contains @semantic_id;"
        );
        assert!(!yql.contains("evil"));
        let sid = &params.iter().find(|(k, _)| *k == SEMANTIC_ID_PARAM).unwrap().1;
        assert_eq!(sid, r#"evil" or true or "x"#);
        let hits = &params.iter().find(|(k, _)| *k == "hits").unwrap().1;
        assert_eq!(hits, "50");
    }

    #[test]
    fn test_decode_chunks_and_total() {
        let body = json!({
            "root": {
                "fields": { "totalCount": 7 },
                "children": [
                    { "fields": { "chunk_id": 1, "content": "abc", "semantic_identifier": "a.pdf", "boost": 2 } },
                    { "fields": { "chunk_id": 0, "content": "" } }
                ]
            }
        })
        .to_string();

        let outcome = decode_response(&body).unwrap();
        match outcome.result {
            IndexQueryResult::Chunks {
                chunks,
                returned,
                total_count,
            } => {
                assert_eq!(total_count, 7);
                assert_eq!(returned, 2);
                assert_eq!(chunks.len(), 2);
                assert_eq!(chunks[0].chunk_id, 1);
                assert_eq!(chunks[0].content, "abc");
                assert_eq!(chunks[0].semantic_id(), Some("a.pdf"));
                assert_eq!(chunks[0].extra.get("boost"), Some(&json!(2)));
                assert_eq!(chunks[1].content_len(), 0);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(outcome.raw.get("root").is_some());
    }

    #[test]
    fn test_total_count_defaults_to_children() {
        let body = r#"{"root":{"children":[{"fields":{"chunk_id":0,"content":"x"}}]}}"#;
        match decode_response(body).unwrap().result {
            IndexQueryResult::Chunks { total_count, .. } => assert_eq!(total_count, 1),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_errors_returned_not_raised() {
        let body = json!({
            "root": {
                "errors": [
                    { "code": 4, "summary": "Invalid query parameter", "message": "bad yql" }
                ],
                "children": [ { "fields": { "chunk_id": 0, "content": "ignored" } } ]
            }
        })
        .to_string();
        match decode_response(&body).unwrap().result {
            IndexQueryResult::Errors(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, json!(4));
                assert_eq!(errors[0].summary, "Invalid query parameter");
                assert_eq!(errors[0].message, "bad yql");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_children_is_empty_chunks() {
        match decode_response(r#"{"root":{"fields":{"totalCount":0}}}"#)
            .unwrap()
            .result
        {
            IndexQueryResult::Chunks {
                chunks,
                total_count,
                ..
            } => {
                assert!(chunks.is_empty());
                assert_eq!(total_count, 0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_hits_without_chunk_id_skipped() {
        let body = r#"{"root":{"children":[
            {"fields":{"content":"no id"}},
            {"fields":{"chunk_id":null,"content":"null id"}},
            {"fields":{"chunk_id":3,"content":"kept"}}
        ]}}"#;
        match decode_response(body).unwrap().result {
            IndexQueryResult::Chunks { chunks, .. } => {
                assert_eq!(chunks.len(), 1);
                assert_eq!(chunks[0].chunk_id, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_skipped_hit_is_not_truncation() {
        let body = r#"{"root":{"children":[
            {"fields":{"chunk_id":0,"content":"a"}},
            {"fields":{"chunk_id":1,"content":"b"}},
            {"fields":{"content":"not a chunk"}}
        ]}}"#;
        let result = decode_response(body).unwrap().result;
        match &result {
            IndexQueryResult::Chunks {
                chunks,
                returned,
                total_count,
            } => {
                assert_eq!(chunks.len(), 2);
                assert_eq!(*returned, 3);
                assert_eq!(*total_count, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let report = crate::analyze::analyze("doc", &result).unwrap();
        assert!(!report.truncated);
        assert_eq!(report.returned_count, 3);
        assert!(!report.has_gaps);
    }

    #[test]
    fn test_non_json_is_decode_error() {
        let err = decode_response("<html>502 Bad Gateway</html>").unwrap_err();
        match err {
            AuditError::Decode { excerpt, .. } => assert!(excerpt.contains("502")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_negative_chunk_id_is_decode_error() {
        let body = r#"{"root":{"children":[{"fields":{"chunk_id":-1,"content":"x"}}]}}"#;
        assert!(matches!(
            decode_response(body),
            Err(AuditError::Decode { .. })
        ));
    }
}
