//! Catalog-vs-index cross check.
//!
//! Compares what the catalog expects for a document with what the analyzer
//! found in the index for the same semantic identifier. The analyzer itself
//! never sees catalog data; this module is where the two paths meet.

use serde::Serialize;

use crate::error::AuditError;
use crate::models::{ConsistencyReport, DocumentRecord, IndexError};

/// Verdict for one catalog document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Contiguous ids whose count matches the catalog.
    Consistent { chunks: usize },
    /// Contiguous ids, but not as many as the catalog records.
    CountMismatch { expected: i64, indexed: usize },
    /// The index is missing ids inside the observed range.
    Gaps { missing: Vec<u64>, indexed: usize },
    /// The hit cap cut the answer short; nothing can be concluded.
    Truncated { returned: u64, total: u64 },
    /// The query succeeded and matched no chunks.
    NotIndexed,
    /// The index rejected the query.
    QueryFailed { error: IndexError },
    /// Contiguous ids, and the catalog has no chunk count to compare with.
    NoExpectation { indexed: usize },
}

impl Reconciliation {
    pub fn is_divergent(&self) -> bool {
        !matches!(
            self,
            Reconciliation::Consistent { .. } | Reconciliation::NoExpectation { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Reconciliation::Consistent { .. } => "ok",
            Reconciliation::CountMismatch { .. } => "count-mismatch",
            Reconciliation::Gaps { .. } => "gaps",
            Reconciliation::Truncated { .. } => "truncated",
            Reconciliation::NotIndexed => "not-indexed",
            Reconciliation::QueryFailed { .. } => "query-failed",
            Reconciliation::NoExpectation { .. } => "no-expectation",
        }
    }
}

/// Most missing ids carried in a [`Reconciliation::Gaps`] verdict.
pub const MAX_LISTED_MISSING: usize = 20;

/// Reconcile one catalog document against its analysis outcome.
///
/// Transport and decode failures are not verdicts about the document and
/// are handed back to the caller.
pub fn reconcile(
    document: &DocumentRecord,
    analysis: Result<ConsistencyReport, AuditError>,
) -> Result<Reconciliation, AuditError> {
    let report = match analysis {
        Ok(report) => report,
        Err(AuditError::EmptyResult { .. }) => return Ok(Reconciliation::NotIndexed),
        Err(AuditError::NoData(errors)) => {
            let error = errors.into_iter().next().unwrap_or(IndexError {
                code: serde_json::Value::Null,
                summary: String::new(),
                message: String::new(),
            });
            return Ok(Reconciliation::QueryFailed { error });
        }
        Err(other) => return Err(other),
    };

    let indexed = report.unique_chunk_ids.len();

    if report.truncated {
        return Ok(Reconciliation::Truncated {
            returned: report.returned_count,
            total: report.total_count,
        });
    }

    if report.has_gaps {
        return Ok(Reconciliation::Gaps {
            missing: report.missing_chunk_ids(MAX_LISTED_MISSING),
            indexed,
        });
    }

    Ok(match document.chunk_count {
        None => Reconciliation::NoExpectation { indexed },
        Some(expected) if expected == indexed as i64 => Reconciliation::Consistent { chunks: indexed },
        Some(expected) => Reconciliation::CountMismatch { expected, indexed },
    })
}
