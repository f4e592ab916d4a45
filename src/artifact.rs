//! Line-delimited JSON artifact produced by batch enrichment.
//!
//! One record per line, embedding inline. `pulse enrich` writes this file;
//! `pulse ask` and `pulse stats` (and any other collaborator, such as a
//! dashboard) read it back. Reads are lossless, including reconstruction of
//! list-typed topic fields from records written as a bare string.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::models::{EnrichedRow, FeedbackRow};

/// Read raw feedback rows (one JSON object per line).
pub fn read_rows(path: &Path) -> Result<Vec<FeedbackRow>> {
    read_jsonl(path)
}

/// Read a previously written enrichment artifact.
pub fn read_enriched(path: &Path) -> Result<Vec<EnrichedRow>> {
    read_jsonl(path)
}

fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(line)
            .with_context(|| format!("Malformed record at {}:{}", path.display(), lineno + 1))?;
        records.push(record);
    }

    Ok(records)
}

/// Write the enrichment artifact, one row per line.
pub fn write_enriched(path: &Path, rows: &[EnrichedRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrichmentResult, FeedbackRow};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_rows() -> Vec<EnrichedRow> {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "event_date".to_string(),
            serde_json::Value::String("2024-05-11".to_string()),
        );

        vec![
            EnrichedRow::join(
                FeedbackRow {
                    id: "ev-001".to_string(),
                    comment: "Loved the band".to_string(),
                    attributes,
                },
                EnrichmentResult {
                    sentiment: "Positive".to_string(),
                    topics: vec!["Music".to_string()],
                    embedding: vec![0.1, 0.2, 0.3],
                },
            ),
            EnrichedRow::join(
                FeedbackRow {
                    id: "ev-002".to_string(),
                    comment: "Cold food".to_string(),
                    attributes: BTreeMap::new(),
                },
                EnrichmentResult::failed(),
            ),
        ]
    }

    #[test]
    fn test_write_then_read_is_lossless() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enriched.jsonl");

        let rows = sample_rows();
        write_enriched(&path, &rows).unwrap();
        let restored = read_enriched(&path).unwrap();

        assert_eq!(rows, restored);
    }

    #[test]
    fn test_read_skips_blank_lines_and_reports_line_numbers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enriched.jsonl");
        fs::write(
            &path,
            "\n{\"id\":\"a\",\"comment\":\"ok\",\"sentiment\":\"Neutral\",\"topics\":\"Venue\",\"embedding\":[]}\n\nnot json\n",
        )
        .unwrap();

        let err = read_enriched(&path).unwrap_err();
        assert!(err.to_string().contains(":4"), "got: {}", err);
    }

    #[test]
    fn test_read_reconstructs_string_topics_as_list() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("enriched.jsonl");
        fs::write(
            &path,
            "{\"id\":\"a\",\"comment\":\"ok\",\"sentiment\":\"Neutral\",\"topics\":\"Venue\",\"embedding\":[0.5]}\n",
        )
        .unwrap();

        let rows = read_enriched(&path).unwrap();
        assert_eq!(rows[0].topics, vec!["Venue".to_string()]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(read_rows(&tmp.path().join("absent.jsonl")).is_err());
    }
}
