//! # Index Audit
//!
//! Consistency auditing between a relational document catalog and the
//! search index that serves the documents' content chunks.
//!
//! Two read paths feed one analysis:
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │   Catalog    │                      │    Index     │
//! │  (Postgres)  │                      │  (HTTP/YQL)  │
//! └──────┬───────┘                      └──────┬───────┘
//!        │ list_documents()                    │ fetch_chunks(semantic_id)
//!        ▼                                     ▼
//!  Vec<DocumentRecord>                  IndexQueryResult
//!        │                                     │
//!        │                              ┌──────▼───────┐
//!        │                              │   analyze    │
//!        │                              └──────┬───────┘
//!        │                                     ▼
//!        └──────────────▶ reconcile ◀── ConsistencyReport
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! idx-audit documents --top 5          # snapshot the catalog
//! idx-audit chunks "Q3 report.pdf"     # check one document's chunks
//! idx-audit audit --limit 50           # cross-check recent documents
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with defaults |
//! | [`models`] | Catalog, chunk and report types |
//! | [`error`] | Failure taxonomy |
//! | [`catalog`] | Catalog reader (Postgres or dump file) |
//! | [`index`] | Index chunk fetcher |
//! | [`analyze`] | Chunk-consistency analysis |
//! | [`reconcile`] | Catalog-vs-index verdicts |
//! | [`output`] | JSON artifacts |
//! | [`report`] | Console output |
//! | [`commands`] | Subcommand entry points |

pub mod analyze;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod models;
pub mod output;
pub mod reconcile;
pub mod report;
