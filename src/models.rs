//! Core data types flowing through the enrichment and retrieval pipeline.
//!
//! These types represent the feedback rows, per-row enrichment outcomes, and
//! the joined records that move from the orchestrator into the vector index
//! and the persisted artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sentinel label recorded when a single provider call (classification or
/// embedding) fails. Distinct from [`SENTINEL_FAILED`] so failure causes
/// stay diagnosable downstream.
pub const SENTINEL_ERROR: &str = "Error";

/// Sentinel label recorded when a whole worker task faults (panic, abort,
/// cancellation) and is caught at the orchestrator's fan-in boundary.
pub const SENTINEL_FAILED: &str = "Failed";

/// Raw feedback row produced by upstream ingestion.
///
/// `id` is the stable unique identifier the whole pipeline keys on.
/// `attributes` carries the categorical dimensions (supplier references,
/// event date, ...) as opaque pass-through values the core never interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub id: String,
    pub comment: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

/// A successfully decoded classification response.
///
/// This is the `Ok` arm of a classification call: both fields were present
/// and well-typed. A malformed response never reaches this type; it is
/// surfaced as an error by the gateway decode instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub sentiment: String,
    pub topics: Vec<String>,
}

/// Per-row enrichment outcome. Produced exactly once per row by the worker;
/// never mutated afterward.
///
/// Invariant: `embedding` is either empty (the call failed) or has exactly
/// the configured dimensionality: the gateway rejects anything else, and
/// the index build re-checks before inserting.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    pub sentiment: String,
    pub topics: Vec<String>,
    pub embedding: Vec<f32>,
}

impl EnrichmentResult {
    /// Result recorded for a worker task that faulted at the fan-in boundary.
    pub fn failed() -> Self {
        Self {
            sentiment: SENTINEL_FAILED.to_string(),
            topics: vec![SENTINEL_FAILED.to_string()],
            embedding: Vec::new(),
        }
    }

    /// True when any part of the enrichment carries a sentinel or the
    /// embedding is missing.
    pub fn is_degraded(&self) -> bool {
        self.sentiment == SENTINEL_ERROR
            || self.sentiment == SENTINEL_FAILED
            || self.embedding.is_empty()
    }
}

/// A [`FeedbackRow`] joined 1:1 with its [`EnrichmentResult`].
///
/// Serialized flat (one JSONL line per row, embedding inline, attributes at
/// the top level) so the persisted artifact round-trips losslessly. Topics
/// always serialize as a list; deserialization also accepts a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub id: String,
    pub comment: String,
    pub sentiment: String,
    #[serde(deserialize_with = "string_or_list")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl EnrichedRow {
    /// Join a row with its enrichment outcome by identity.
    pub fn join(row: FeedbackRow, enrichment: EnrichmentResult) -> Self {
        Self {
            id: row.id,
            comment: row.comment,
            sentiment: enrichment.sentiment,
            topics: enrichment.topics,
            embedding: enrichment.embedding,
            attributes: row.attributes,
        }
    }

    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.sentiment == SENTINEL_ERROR
            || self.sentiment == SENTINEL_FAILED
            || self.embedding.is_empty()
    }
}

/// Deserialize a topic field that may be a bare string or a list of strings.
pub(crate) fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_row_roundtrip() {
        let mut attributes = BTreeMap::new();
        attributes.insert("supplier_dj".to_string(), Value::String("DJ C".to_string()));
        attributes.insert("guests".to_string(), Value::from(120));

        let row = EnrichedRow {
            id: "ev-001".to_string(),
            comment: "Great sound, terrible catering.".to_string(),
            sentiment: "Mixed".to_string(),
            topics: vec!["Sound".to_string(), "Catering".to_string()],
            embedding: vec![0.25, -1.5, 3.0],
            attributes,
        };

        let line = serde_json::to_string(&row).unwrap();
        let restored: EnrichedRow = serde_json::from_str(&line).unwrap();
        assert_eq!(row, restored);

        // Attributes land at the top level of the record, not nested.
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["supplier_dj"], Value::String("DJ C".to_string()));
        assert!(value.get("attributes").is_none());
    }

    #[test]
    fn test_topics_accept_bare_string() {
        let line = r#"{"id":"ev-002","comment":"ok","sentiment":"Neutral","topics":"Venue","embedding":[]}"#;
        let row: EnrichedRow = serde_json::from_str(line).unwrap();
        assert_eq!(row.topics, vec!["Venue".to_string()]);
    }

    #[test]
    fn test_missing_topics_is_an_error() {
        let line = r#"{"id":"ev-003","comment":"ok","sentiment":"Neutral","embedding":[]}"#;
        assert!(serde_json::from_str::<EnrichedRow>(line).is_err());
    }

    #[test]
    fn test_sentinel_taxonomy() {
        let failed = EnrichmentResult::failed();
        assert_eq!(failed.sentiment, SENTINEL_FAILED);
        assert!(failed.embedding.is_empty());
        assert!(failed.is_degraded());
        assert_ne!(SENTINEL_ERROR, SENTINEL_FAILED);
    }
}
