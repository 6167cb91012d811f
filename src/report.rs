//! Console rendering for the entry points.
//!
//! Everything here writes to stdout; diagnostics go through `tracing` on
//! stderr.

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::{ConsistencyReport, DocumentRecord, IndexError};
use crate::reconcile::{Reconciliation, MAX_LISTED_MISSING};

/// Longest sample record printed, in characters.
pub const SAMPLE_PREVIEW_CHARS: usize = 1000;

pub fn print_documents(documents: &[DocumentRecord], top: usize) {
    println!("Found {} documents.", documents.len());
    if documents.is_empty() || top == 0 {
        return;
    }

    println!("Top {} documents:", top.min(documents.len()));
    for doc in documents.iter().take(top) {
        let age = format_age(&doc.updated_at).unwrap_or_else(|| "unknown age".to_string());
        println!();
        println!("  [{}] updated {}", doc.semantic_id, age);
        match serde_json::to_string_pretty(doc) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{:?}", doc),
        }
    }
}

pub fn print_chunk_summary(semantic_id: &str, report: &ConsistencyReport) {
    println!("=== Chunks for semantic identifier: '{}' ===", semantic_id);
    println!(
        "Total hits: {}  |  totalCount: {}",
        report.returned_count, report.total_count
    );
    if report.truncated {
        println!(
            "  ! Result capped at {} of {} matches; gaps at the tail may be an undercount, raise --hits.",
            report.returned_count, report.total_count
        );
    }

    let (lo, hi) = report.range();
    println!();
    println!("Logical chunks:");
    println!("  Unique chunk_ids: {}", report.unique_chunk_ids.len());
    println!("  Range: {} → {}", lo, hi);
    if report.has_gaps {
        let missing = report.missing_chunk_ids(MAX_LISTED_MISSING);
        let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
        let absent = (hi - lo)
            .saturating_add(1)
            .saturating_sub(report.unique_chunk_ids.len() as u64);
        println!(
            "  ✘ Missing chunk ids ({} absent): {}{}",
            absent,
            listed.join(", "),
            if absent > missing.len() as u64 { ", ..." } else { "" }
        );
    } else {
        println!("  ✔ No gaps, all chunks present.");
    }

    let stats = &report.content_length_stats;
    println!();
    println!("Chunk content lengths:");
    println!("  Min: {} chars", stats.min);
    println!("  Max: {} chars", stats.max);
    println!("  Avg: {:.1} chars", stats.mean);

    println!();
    println!("Sample chunk (chunk_id {}):", report.sample_chunk.chunk_id);
    let sample = serde_json::to_string_pretty(&report.sample_chunk)
        .unwrap_or_else(|_| format!("{:?}", report.sample_chunk));
    println!("{}", truncate_chars(&sample, SAMPLE_PREVIEW_CHARS));
}

pub fn print_service_errors(errors: &[IndexError]) {
    println!("✘ Index returned {} error(s):", errors.len());
    for err in errors {
        println!("  {}", err);
    }
}

pub fn print_empty_result(semantic_id: &str) {
    println!("! No chunks found for '{}'.", semantic_id);
}

pub fn print_audit_header() {
    println!(
        "  {:<40} {:>8} {:>8}   {}",
        "SEMANTIC ID", "CATALOG", "INDEXED", "STATUS"
    );
    println!("  {}", "-".repeat(76));
}

pub fn print_audit_row(document: &DocumentRecord, verdict: &Reconciliation) {
    let expected = document
        .chunk_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    let indexed = match verdict {
        Reconciliation::Consistent { chunks } => chunks.to_string(),
        Reconciliation::CountMismatch { indexed, .. }
        | Reconciliation::Gaps { indexed, .. }
        | Reconciliation::NoExpectation { indexed } => indexed.to_string(),
        Reconciliation::Truncated { returned, .. } => format!("{}+", returned),
        Reconciliation::NotIndexed => "0".to_string(),
        Reconciliation::QueryFailed { .. } => "?".to_string(),
    };
    let detail = match verdict {
        Reconciliation::Gaps { missing, .. } => {
            let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
            format!(" (missing {})", listed.join(", "))
        }
        Reconciliation::Truncated { total, .. } => format!(" (of {})", total),
        Reconciliation::QueryFailed { error } => format!(" {}", error),
        _ => String::new(),
    };
    println!(
        "  {:<40} {:>8} {:>8}   {}{}",
        truncate_chars(&document.semantic_id, 40),
        expected,
        indexed,
        verdict.label(),
        detail
    );
}

pub fn print_audit_footer(checked: usize, divergent: usize) {
    println!();
    println!("Checked {} documents, {} divergent.", checked, divergent);
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Parse a catalog timestamp as rendered by Postgres or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .ok()
}

/// Relative age of a catalog timestamp (e.g. "3 hours ago").
pub fn format_age(raw: &str) -> Option<String> {
    let ts = parse_timestamp(raw)?;
    Some(format_relative(ts.timestamp(), Utc::now().timestamp()))
}

fn format_relative(ts: i64, now: i64) -> String {
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
