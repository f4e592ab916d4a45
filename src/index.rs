//! In-memory vector index over enriched feedback.
//!
//! [`VectorIndex::build`] filters enriched rows to those with a usable
//! embedding and loads them into a collection supporting top-k cosine
//! similarity queries. Each document is keyed by the row's stable
//! identifier; repeated identifiers upsert, so rebuilding over the same
//! collection is idempotent.
//!
//! The index is plain data with no interior mutability: build it once, then
//! share it immutably with readers. A caller that needs to rebuild while
//! serving queries wraps it in an `RwLock` (single writer, many readers).

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::info;

use crate::models::EnrichedRow;

/// Queryable similarity index over a named collection of documents.
pub struct VectorIndex {
    collection: String,
    dims: usize,
    entries: Vec<IndexEntry>,
    by_id: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    id: String,
    text: String,
    vector: Vec<f32>,
    metadata: BTreeMap<String, Value>,
}

/// A document returned from a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub metadata: BTreeMap<String, Value>,
}

impl VectorIndex {
    pub fn new(collection: &str, dims: usize) -> Self {
        Self {
            collection: collection.to_string(),
            dims,
            entries: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Build an index from enriched rows.
    ///
    /// Rows whose embedding is empty or of the wrong dimensionality are
    /// excluded entirely (never indexed with a placeholder vector); the
    /// discard count is logged.
    pub fn build(collection: &str, dims: usize, rows: &[EnrichedRow]) -> Self {
        let mut index = Self::new(collection, dims);
        let mut discarded = 0usize;

        for row in rows {
            if !index.upsert(row) {
                discarded += 1;
            }
        }

        if discarded > 0 {
            info!(
                collection = %index.collection,
                discarded,
                "rows without a usable embedding were not indexed"
            );
        }
        info!(
            collection = %index.collection,
            documents = index.len(),
            "vector index built"
        );

        index
    }

    /// Insert a row, replacing any existing entry with the same identifier.
    ///
    /// Returns `false` (and stores nothing) when the row's embedding is
    /// missing or has the wrong dimensionality.
    pub fn upsert(&mut self, row: &EnrichedRow) -> bool {
        if row.embedding.len() != self.dims {
            return false;
        }

        let entry = IndexEntry {
            id: row.id.clone(),
            text: row.comment.clone(),
            vector: row.embedding.clone(),
            metadata: row_metadata(row),
        };

        match self.by_id.get(&row.id) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.by_id.insert(row.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }

        true
    }

    /// Return the `k` documents most similar to `vector`, most-similar
    /// first. Ties break on identifier so repeated queries rank
    /// deterministically.
    pub fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredDocument> {
        if vector.len() != self.dims || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|entry| ScoredDocument {
                id: entry.id.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(vector, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        scored.truncate(k);
        scored
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metadata for one document: every enriched field except the comment text
/// and the raw vector. Metadata slots accept scalar values only, so
/// list-valued fields are flattened to a delimited string.
fn row_metadata(row: &EnrichedRow) -> BTreeMap<String, Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "sentiment".to_string(),
        Value::String(row.sentiment.clone()),
    );
    metadata.insert("topics".to_string(), Value::String(row.topics.join(", ")));
    for (key, value) in &row.attributes {
        metadata.insert(key.clone(), scalarize(value));
    }
    metadata
}

fn scalarize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(value_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, and `0.0` for empty vectors or vectors
/// of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn enriched(id: &str, comment: &str, embedding: Vec<f32>) -> EnrichedRow {
        EnrichedRow {
            id: id.to_string(),
            comment: comment.to_string(),
            sentiment: "Positive".to_string(),
            topics: vec!["Sound".to_string(), "Venue".to_string()],
            embedding,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_build_excludes_unusable_embeddings() {
        let rows = vec![
            enriched("a", "good", vec![1.0, 0.0]),
            enriched("b", "failed", vec![]),
            enriched("c", "truncated", vec![1.0]),
            enriched("d", "fine", vec![0.0, 1.0]),
        ];

        let index = VectorIndex::build("feedback", 2, &rows);
        assert_eq!(index.len(), 2);

        // The discarded rows are gone entirely, not indexed with placeholders.
        let hits = index.query(&[1.0, 0.0], 10);
        let ids: Vec<&str> = hits.iter().map(|d| d.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"d"));
        assert!(!ids.contains(&"b"));
        assert!(!ids.contains(&"c"));
    }

    #[test]
    fn test_build_empty_rows_yields_empty_index() {
        let index = VectorIndex::build("feedback", 3, &[]);
        assert!(index.is_empty());
        assert!(index.query(&[1.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_identifier() {
        let mut index = VectorIndex::new("feedback", 2);
        assert!(index.upsert(&enriched("a", "first version", vec![1.0, 0.0])));
        assert!(index.upsert(&enriched("a", "second version", vec![0.0, 1.0])));

        assert_eq!(index.len(), 1);
        let hits = index.query(&[0.0, 1.0], 1);
        assert_eq!(hits[0].text, "second version");
    }

    #[test]
    fn test_query_ranks_most_similar_first() {
        let rows = vec![
            enriched("far", "far", vec![0.0, 1.0]),
            enriched("near", "near", vec![1.0, 0.05]),
            enriched("exact", "exact", vec![1.0, 0.0]),
        ];
        let index = VectorIndex::build("feedback", 2, &rows);

        let hits = index.query(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "exact");
        assert_eq!(hits[1].id, "near");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_query_is_deterministic_for_ties() {
        let rows = vec![
            enriched("b", "twin b", vec![1.0, 0.0]),
            enriched("a", "twin a", vec![1.0, 0.0]),
        ];
        let index = VectorIndex::build("feedback", 2, &rows);

        let first = index.query(&[1.0, 0.0], 2);
        let second = index.query(&[1.0, 0.0], 2);
        let order: Vec<&str> = first.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(
            order,
            second.iter().map(|d| d.id.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_metadata_flattens_lists_and_skips_text_and_vector() {
        let mut row = enriched("a", "the comment", vec![1.0, 0.0]);
        row.attributes.insert(
            "tags".to_string(),
            serde_json::json!(["wedding", "outdoor"]),
        );
        row.attributes
            .insert("supplier_dj".to_string(), Value::String("DJ C".to_string()));

        let index = VectorIndex::build("feedback", 2, std::slice::from_ref(&row));
        let hit = &index.query(&[1.0, 0.0], 1)[0];

        assert_eq!(
            hit.metadata.get("topics"),
            Some(&Value::String("Sound, Venue".to_string()))
        );
        assert_eq!(
            hit.metadata.get("tags"),
            Some(&Value::String("wedding, outdoor".to_string()))
        );
        assert_eq!(
            hit.metadata.get("supplier_dj"),
            Some(&Value::String("DJ C".to_string()))
        );
        assert!(hit.metadata.get("comment").is_none());
        assert!(hit.metadata.get("embedding").is_none());
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_or_empty() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
