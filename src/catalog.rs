//! Catalog reader.
//!
//! Enumerates every document the relational catalog knows about, most
//! recently updated first. Two backends implement [`CatalogReader`]:
//!
//! - **[`PgCatalog`]** — queries the `document` table through a Postgres
//!   connection pool with typed column decoding.
//! - **[`DumpCatalog`]** — parses a delimiter-separated export of the same
//!   eight columns (the unaligned, tuples-only output of `psql -A -t`).
//!
//! # Dump format
//!
//! One record per line, eight fields joined by a single delimiter:
//!
//! ```text
//! id|semantic_id|chunk_count|from_ingestion_api|hidden|boost|link|doc_updated_at
//! ```
//!
//! Booleans are true only for the token `t`. NULL is an empty field, and an
//! empty numeric field is absent rather than zero. Blank lines are ignored;
//! any other line without exactly eight fields fails the whole read.

use async_trait::async_trait;
use sqlx::Row;
use std::path::PathBuf;

use crate::config::CatalogConfig;
use crate::db;
use crate::error::{AuditError, AuditResult};
use crate::models::DocumentRecord;

/// Number of columns selected from the document table.
pub const CATALOG_FIELDS: usize = 8;

/// Token a boolean column renders as when true.
pub const TRUTHY_TOKEN: &str = "t";

const DOCUMENT_QUERY: &str = r#"
    SELECT
        d.id,
        d.semantic_id,
        d.chunk_count::bigint AS chunk_count,
        d.from_ingestion_api,
        d.hidden,
        d.boost::bigint AS boost,
        COALESCE(d.link, '') AS link,
        COALESCE(d.doc_updated_at::text, '') AS updated_at
    FROM document d
    ORDER BY d.doc_updated_at DESC
"#;

/// A source of catalog document records.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Short label for logs (e.g. `"postgres"`, `"dump"`).
    fn kind(&self) -> &str;

    /// Every document, ordered by update time descending.
    async fn list_documents(&self) -> AuditResult<Vec<DocumentRecord>>;
}

/// Pick the backend the configuration asks for.
pub fn open_catalog(config: &CatalogConfig) -> Box<dyn CatalogReader> {
    match &config.dump_path {
        Some(path) => Box::new(DumpCatalog::new(path.clone(), config.delimiter_char())),
        None => Box::new(PgCatalog::new(config.clone())),
    }
}

/// Reads the catalog straight from Postgres.
pub struct PgCatalog {
    config: CatalogConfig,
}

impl PgCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    fn kind(&self) -> &str {
        "postgres"
    }

    async fn list_documents(&self) -> AuditResult<Vec<DocumentRecord>> {
        let pool = db::connect(&self.config).await?;

        let rows = sqlx::query(DOCUMENT_QUERY).fetch_all(&pool).await;
        pool.close().await;
        let rows = rows?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            let from_ingestion_api: Option<bool> = row.try_get("from_ingestion_api")?;
            let hidden: Option<bool> = row.try_get("hidden")?;
            documents.push(DocumentRecord {
                id: row.try_get("id")?,
                semantic_id: row.try_get("semantic_id")?,
                chunk_count: row.try_get("chunk_count")?,
                from_ingestion_api: from_ingestion_api.unwrap_or(false),
                hidden: hidden.unwrap_or(false),
                boost: row.try_get("boost")?,
                link: row.try_get("link")?,
                updated_at: row.try_get("updated_at")?,
            });
        }

        tracing::info!(documents = documents.len(), "read catalog from postgres");
        Ok(documents)
    }
}

/// Reads the catalog from a delimiter-separated dump file.
pub struct DumpCatalog {
    path: PathBuf,
    delimiter: char,
}

impl DumpCatalog {
    pub fn new(path: PathBuf, delimiter: char) -> Self {
        Self { path, delimiter }
    }
}

#[async_trait]
impl CatalogReader for DumpCatalog {
    fn kind(&self) -> &str {
        "dump"
    }

    async fn list_documents(&self) -> AuditResult<Vec<DocumentRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AuditError::Io {
                path: self.path.clone(),
                source,
            })?;
        let documents = parse_catalog_table(&raw, self.delimiter)?;
        tracing::info!(
            documents = documents.len(),
            path = %self.path.display(),
            "read catalog from dump"
        );
        Ok(documents)
    }
}

/// Parse a delimiter-separated document table.
///
/// Record order is preserved; the dump is expected to already be sorted by
/// update time.
pub fn parse_catalog_table(raw: &str, delimiter: char) -> AuditResult<Vec<DocumentRecord>> {
    let mut documents = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        documents.push(parse_record(line, delimiter, idx + 1)?);
    }

    Ok(documents)
}

fn parse_record(line: &str, delimiter: char, line_no: usize) -> AuditResult<DocumentRecord> {
    let fields: Vec<&str> = line.split(delimiter).collect();
    if fields.len() != CATALOG_FIELDS {
        return Err(AuditError::Parse {
            line: line_no,
            message: format!(
                "expected {} fields, found {}",
                CATALOG_FIELDS,
                fields.len()
            ),
        });
    }

    Ok(DocumentRecord {
        id: fields[0].to_string(),
        semantic_id: fields[1].to_string(),
        chunk_count: parse_optional_int(fields[2], "chunk_count", line_no)?,
        from_ingestion_api: parse_flag(fields[3]),
        hidden: parse_flag(fields[4]),
        boost: parse_optional_int(fields[5], "boost", line_no)?,
        link: fields[6].to_string(),
        updated_at: fields[7].to_string(),
    })
}

fn parse_flag(raw: &str) -> bool {
    raw == TRUTHY_TOKEN
}

fn parse_optional_int(raw: &str, column: &str, line_no: usize) -> AuditResult<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|e| AuditError::Parse {
            line: line_no,
            message: format!("{} '{}' is not an integer: {}", column, raw, e),
        })
}
