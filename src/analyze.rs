//! Chunk-consistency analysis.
//!
//! Turns one index answer into a [`ConsistencyReport`]. Two different
//! populations feed the report:
//!
//! - gap detection and the sample use the **deduplicated** chunk ids, with
//!   the first record seen standing in for each id;
//! - length statistics use **every returned record**, duplicates included.
//!
//! Ids are expected to run contiguously from whatever the lowest returned
//! id is; a non-zero base is not a gap.

use std::collections::BTreeMap;

use crate::error::{AuditError, AuditResult};
use crate::models::{ChunkRecord, ConsistencyReport, ContentLengthStats, IndexQueryResult};

/// Analyze the index answer for `semantic_id`.
///
/// # Errors
///
/// - [`AuditError::NoData`] when the service reported errors; no chunk
///   field is read in that case.
/// - [`AuditError::EmptyResult`] when the query matched nothing.
pub fn analyze(semantic_id: &str, result: &IndexQueryResult) -> AuditResult<ConsistencyReport> {
    let (chunks, returned_count, total_count) = match result {
        IndexQueryResult::Errors(errors) => return Err(AuditError::NoData(errors.clone())),
        IndexQueryResult::Chunks {
            chunks,
            returned,
            total_count,
        } => (chunks, *returned, *total_count),
    };

    let Some(content_length_stats) = length_stats(chunks) else {
        return Err(AuditError::EmptyResult {
            semantic_id: semantic_id.to_string(),
        });
    };

    let mut first_seen: BTreeMap<u64, &ChunkRecord> = BTreeMap::new();
    for chunk in chunks {
        first_seen.entry(chunk.chunk_id).or_insert(chunk);
    }

    let unique_chunk_ids: Vec<u64> = first_seen.keys().copied().collect();
    let has_gaps = has_gaps(&unique_chunk_ids);

    // first_seen is non-empty because chunks is
    let (_, sample) = first_seen
        .first_key_value()
        .ok_or_else(|| AuditError::EmptyResult {
            semantic_id: semantic_id.to_string(),
        })?;
    let sample_chunk = (*sample).clone();

    Ok(ConsistencyReport {
        unique_chunk_ids,
        has_gaps,
        content_length_stats,
        sample_chunk,
        returned_count,
        total_count,
        truncated: total_count > returned_count,
    })
}

/// `true` unless the sorted, deduplicated ids are exactly `lo..=hi`.
pub fn has_gaps(sorted_unique: &[u64]) -> bool {
    match (sorted_unique.first(), sorted_unique.last()) {
        (Some(&lo), Some(&hi)) => (hi - lo) as u128 + 1 != sorted_unique.len() as u128,
        _ => false,
    }
}

/// Length statistics over every record, or `None` for an empty slice.
pub fn length_stats(chunks: &[ChunkRecord]) -> Option<ContentLengthStats> {
    let lengths: Vec<usize> = chunks.iter().map(ChunkRecord::content_len).collect();
    let min = *lengths.iter().min()?;
    let max = *lengths.iter().max()?;
    let total: u128 = lengths.iter().map(|&l| l as u128).sum();
    let mean = total as f64 / lengths.len() as f64;
    Some(ContentLengthStats { min, max, mean })
}
