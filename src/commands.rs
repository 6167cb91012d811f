//! Entry points behind the `idx-audit` subcommands.
//!
//! Each function runs one operator workflow end to end and reports whether
//! the audited state was clean. Fatal failures (transport, decode, I/O)
//! are returned as errors; findings about the data are not errors.

use anyhow::{Context, Result};

use crate::analyze::analyze;
use crate::catalog::open_catalog;
use crate::config::Config;
use crate::error::AuditError;
use crate::index::IndexClient;
use crate::output;
use crate::reconcile::reconcile;
use crate::report;

/// Options shared by the commands that write artifacts.
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    pub save: bool,
}

/// List the catalog, save it, and print the `top` most recent documents.
pub async fn run_documents(config: &Config, top: usize, opts: SaveOptions) -> Result<bool> {
    let catalog = open_catalog(&config.catalog);
    tracing::debug!(backend = catalog.kind(), "listing catalog documents");
    let documents = catalog.list_documents().await?;

    if opts.save {
        let path = output::catalog_path(&config.output.dir);
        output::write_json(&path, &documents)
            .with_context(|| "Failed to save catalog snapshot")?;
        eprintln!("Saved catalog snapshot to {}", path.display());
    }

    report::print_documents(&documents, top);
    Ok(true)
}

/// Fetch and analyze the chunks of one document.
///
/// Returns `false` when the index rejected the query, matched nothing, or
/// the chunk ids have gaps.
pub async fn run_chunks(
    config: &Config,
    semantic_id: &str,
    hits: Option<u32>,
    opts: SaveOptions,
) -> Result<bool> {
    let hits = hits.unwrap_or(config.index.hits);
    if hits == 0 {
        anyhow::bail!("--hits must be >= 1");
    }

    let client = IndexClient::new(config.index.clone())?;
    let outcome = client.fetch_chunks_with_hits(semantic_id, hits).await?;

    if opts.save {
        let path = output::chunks_path(&config.output.dir, semantic_id);
        output::write_json(&path, &outcome.raw)
            .with_context(|| "Failed to save index response")?;
        eprintln!("Saved index response to {}", path.display());
    }

    match analyze(semantic_id, &outcome.result) {
        Ok(consistency) => {
            report::print_chunk_summary(semantic_id, &consistency);
            Ok(!consistency.has_gaps)
        }
        Err(AuditError::NoData(errors)) => {
            report::print_service_errors(&errors);
            Ok(false)
        }
        Err(AuditError::EmptyResult { semantic_id }) => {
            report::print_empty_result(&semantic_id);
            Ok(false)
        }
        Err(other) => Err(other.into()),
    }
}

/// Reconcile the `limit` most recent catalog documents against the index,
/// one at a time.
pub async fn run_audit(config: &Config, limit: usize, hits: Option<u32>) -> Result<bool> {
    let hits = hits.unwrap_or(config.index.hits);
    if hits == 0 {
        anyhow::bail!("--hits must be >= 1");
    }

    let catalog = open_catalog(&config.catalog);
    let documents = catalog.list_documents().await?;
    let client = IndexClient::new(config.index.clone())?;

    let selected = &documents[..limit.min(documents.len())];
    tracing::info!(
        documents = selected.len(),
        of = documents.len(),
        hits,
        "auditing catalog documents against index"
    );

    report::print_audit_header();
    let mut divergent = 0;
    for document in selected {
        let outcome = client
            .fetch_chunks_with_hits(&document.semantic_id, hits)
            .await
            .with_context(|| format!("Failed to fetch chunks for '{}'", document.semantic_id))?;
        let verdict = reconcile(document, analyze(&document.semantic_id, &outcome.result))?;
        if verdict.is_divergent() {
            divergent += 1;
        }
        report::print_audit_row(document, &verdict);
    }
    report::print_audit_footer(selected.len(), divergent);

    Ok(divergent == 0)
}
