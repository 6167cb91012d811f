//! # Index Audit CLI (`idx-audit`)
//!
//! Operator commands for checking that the search index holds what the
//! document catalog says was ingested.
//!
//! ## Usage
//!
//! ```bash
//! idx-audit --config ./config/audit.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `idx-audit documents` | Snapshot the catalog and show the most recent documents |
//! | `idx-audit chunks <semantic-id>` | Fetch one document's chunks and check contiguity |
//! | `idx-audit audit` | Cross-check recent catalog documents against the index |
//!
//! Set `RUST_LOG=debug` for request-level diagnostics on stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use index_audit::commands::{self, SaveOptions};
use index_audit::config;

/// Index Audit: consistency checks between a document catalog and its
/// search index.
#[derive(Parser)]
#[command(
    name = "idx-audit",
    about = "Index Audit: consistency checks between a document catalog and its search index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/audit.toml`. Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/audit.toml")]
    config: PathBuf,

    /// Do not write JSON artifacts to the output directory.
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog documents, most recently updated first.
    ///
    /// Writes the full snapshot to `<output.dir>/catalog.json`.
    Documents {
        /// Number of documents to print.
        #[arg(long, default_value_t = 3)]
        top: usize,
    },

    /// Check the chunks the index holds for one document.
    ///
    /// Reports unique chunk ids and their range, whether the ids have
    /// gaps, content length statistics and a sample chunk. Exits non-zero
    /// when the index rejects the query, holds no chunks, or the ids have
    /// gaps.
    Chunks {
        /// Semantic identifier of the document (e.g. `"Q3 report.pdf"`).
        semantic_id: String,

        /// Maximum records to request. Must exceed the document's chunk
        /// count or the tail will look missing.
        #[arg(long)]
        hits: Option<u32>,
    },

    /// Reconcile recent catalog documents against the index.
    ///
    /// Exits non-zero when any document diverges.
    Audit {
        /// Number of most recently updated documents to check.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Maximum records to request per document.
        #[arg(long)]
        hits: Option<u32>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;
    let opts = SaveOptions { save: !cli.no_save };

    let clean = match cli.command {
        Commands::Documents { top } => commands::run_documents(&cfg, top, opts).await?,
        Commands::Chunks { semantic_id, hits } => {
            let semantic_id = semantic_id.trim();
            if semantic_id.is_empty() {
                anyhow::bail!("semantic identifier must not be empty");
            }
            commands::run_chunks(&cfg, semantic_id, hits, opts).await?
        }
        Commands::Audit { limit, hits } => commands::run_audit(&cfg, limit, hits).await?,
    };

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
