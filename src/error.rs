//! Failure classes surfaced by the catalog reader, the index fetcher and
//! the analyzer.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::IndexError;

/// Longest excerpt of an undecodable payload kept for diagnosis.
pub const EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The store or service could not be reached, or answered with a
    /// failed status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the structured data we expected.
    #[error("failed to decode response: {message}\n--- payload excerpt ---\n{excerpt}")]
    Decode { message: String, excerpt: String },

    /// A catalog record did not have the expected shape.
    #[error("malformed catalog record on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The index answered but rejected the query. Never empty.
    #[error("index reported {} error(s), first: {}", .0.len(), first_error(.0))]
    NoData(Vec<IndexError>),

    /// The query succeeded and matched nothing.
    #[error("no chunks indexed for '{semantic_id}'")]
    EmptyResult { semantic_id: String },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn first_error(errors: &[IndexError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(none)".to_string())
}

impl AuditError {
    /// Build a [`AuditError::Decode`] keeping a bounded excerpt of `raw`.
    pub fn decode(message: impl Into<String>, raw: &str) -> Self {
        AuditError::Decode {
            message: message.into(),
            excerpt: raw.chars().take(EXCERPT_CHARS).collect(),
        }
    }

    /// Every service-reported error entry, empty for other variants.
    pub fn service_errors(&self) -> &[IndexError] {
        match self {
            AuditError::NoData(errors) => errors,
            _ => &[],
        }
    }
}

impl From<sqlx::Error> for AuditError {
    fn from(e: sqlx::Error) -> Self {
        AuditError::Transport(format!("catalog: {}", e))
    }
}

impl From<reqwest::Error> for AuditError {
    fn from(e: reqwest::Error) -> Self {
        AuditError::Transport(format!("index: {}", e))
    }
}

pub type AuditResult<T> = Result<T, AuditError>;
