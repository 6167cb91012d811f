//! Core data models used throughout the auditor.
//!
//! These types represent the catalog documents, index chunks, and the
//! consistency verdicts that flow between the readers and the analyzer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the catalog's document table.
///
/// `chunk_count` and `boost` are `None` when the catalog holds NULL; a
/// stored zero stays `Some(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub semantic_id: String,
    pub chunk_count: Option<i64>,
    pub from_ingestion_api: bool,
    pub hidden: bool,
    pub boost: Option<i64>,
    pub link: String,
    pub updated_at: String,
}

/// A single chunk as held by the index.
///
/// Only `chunk_id` and `content` are interpreted. Every other field the
/// index returns is kept verbatim in `extra` and written back out when the
/// record is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChunkRecord {
    /// Content length in Unicode scalar values.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// The semantic identifier the index reports for this chunk, if any.
    pub fn semantic_id(&self) -> Option<&str> {
        self.extra.get("semantic_identifier").and_then(Value::as_str)
    }
}

/// An error entry reported by the index service for a query it rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexError {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match &self.code {
            Value::String(s) => s.clone(),
            Value::Null => "?".to_string(),
            other => other.to_string(),
        };
        write!(f, "[{}] {}: {}", code, self.summary, self.message)
    }
}

/// Outcome of one index query.
///
/// The service either answers with hits or flags the query itself; the two
/// never mix.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexQueryResult {
    Chunks {
        chunks: Vec<ChunkRecord>,
        /// Hits in the answer, including ones that were not chunks.
        returned: u64,
        total_count: u64,
    },
    Errors(Vec<IndexError>),
}

/// Min / max / mean of chunk content lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentLengthStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

/// Verdict of the chunk-consistency analysis for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Sorted ascending, no duplicates.
    pub unique_chunk_ids: Vec<u64>,
    pub has_gaps: bool,
    pub content_length_stats: ContentLengthStats,
    /// The first record seen for the lowest chunk id.
    pub sample_chunk: ChunkRecord,
    /// Hits the index returned, duplicates included.
    pub returned_count: u64,
    /// Matches the index says exist.
    pub total_count: u64,
    /// The hit cap cut the result short; tail gaps may be an artifact.
    pub truncated: bool,
}

impl ConsistencyReport {
    /// Lowest and highest chunk id.
    pub fn range(&self) -> (u64, u64) {
        // unique_chunk_ids is never empty for a constructed report
        let lo = self.unique_chunk_ids.first().copied().unwrap_or_default();
        let hi = self.unique_chunk_ids.last().copied().unwrap_or_default();
        (lo, hi)
    }

    /// Up to `limit` ids absent from the `lo..=hi` range, ascending.
    pub fn missing_chunk_ids(&self, limit: usize) -> Vec<u64> {
        let mut missing = Vec::new();
        for pair in self.unique_chunk_ids.windows(2) {
            for id in (pair[0] + 1)..pair[1] {
                if missing.len() >= limit {
                    return missing;
                }
                missing.push(id);
            }
        }
        missing
    }
}
