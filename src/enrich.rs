//! Row enrichment worker and concurrent orchestrator.
//!
//! The worker ([`enrich_one`]) applies the gateway's classification and
//! embedding capabilities to a single comment and never fails: each call's
//! error is absorbed into sentinel data. The orchestrator ([`enrich_all`])
//! fans the worker over all rows on a bounded pool and reassembles results
//! in the original row order.
//!
//! ```text
//!  rows ──▶ fan-out (bounded, one task per row)
//!              │ completes in arbitrary order
//!              ▼
//!        fan-in keyed by row position index
//!              │
//!              ▼
//!  EnrichedRow sequence, output[i] == input[i]
//! ```
//!
//! Fan-in is keyed by the position index carried with each task, never by
//! the comment text: two rows with identical comments must not have their
//! results transposed.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::gateway::AiGateway;
use crate::models::{EnrichedRow, EnrichmentResult, FeedbackRow, SENTINEL_ERROR};

/// Cap on the comment prefix included in diagnostics. Logs identify the
/// failing row without replaying full comment bodies.
const LOG_PREFIX_CHARS: usize = 32;

fn text_prefix(text: &str) -> String {
    if text.chars().count() <= LOG_PREFIX_CHARS {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(LOG_PREFIX_CHARS).collect();
        format!("{}...", prefix)
    }
}

/// Enrich one comment. Never fails.
///
/// Issues two independent gateway calls; a classification failure does not
/// prevent the embedding attempt and vice versa. A failed call leaves the
/// [`SENTINEL_ERROR`] label or an empty embedding in its place.
pub async fn enrich_one(gateway: &dyn AiGateway, text: &str) -> EnrichmentResult {
    let (sentiment, topics) = match gateway.classify(text).await {
        Ok(classification) => (classification.sentiment, classification.topics),
        Err(e) => {
            warn!(comment = %text_prefix(text), error = %e, "classification call failed");
            (
                SENTINEL_ERROR.to_string(),
                vec![SENTINEL_ERROR.to_string()],
            )
        }
    };

    let embedding = match gateway.embed(text).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!(comment = %text_prefix(text), error = %e, "embedding call failed");
            Vec::new()
        }
    };

    EnrichmentResult {
        sentiment,
        topics,
        embedding,
    }
}

/// Enrich all rows concurrently, preserving input order in the output.
///
/// At most `workers` rows are in flight at once; completion order is
/// unspecified and irrelevant. Failure semantics:
///
/// - a provider-call failure inside the worker becomes `"Error"` sentinel
///   data for that row only;
/// - a worker task that panics is caught at the fan-in boundary and mapped
///   to the `"Failed"` sentinel without aborting its siblings;
/// - when `cancel` fires, rows not yet dispatched and rows still in flight
///   complete as `"Failed"`.
///
/// There are no retries: partial success is the normal completion mode, and
/// the returned sequence always has one entry per input row.
pub async fn enrich_all(
    gateway: Arc<dyn AiGateway>,
    rows: Vec<FeedbackRow>,
    workers: usize,
    cancel: &CancellationToken,
) -> Vec<EnrichedRow> {
    let workers = workers.max(1);

    let jobs: Vec<(usize, String)> = rows
        .iter()
        .map(|row| row.comment.clone())
        .enumerate()
        .collect();

    let mut results: Vec<Option<EnrichmentResult>> = Vec::with_capacity(rows.len());
    results.resize_with(rows.len(), || None);

    let mut completions = stream::iter(jobs.into_iter().map(|(idx, text)| {
        let gateway = Arc::clone(&gateway);
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return (idx, EnrichmentResult::failed());
            }

            // One task per row: a panicking worker surfaces as a JoinError
            // here instead of taking down the orchestrator.
            let mut handle =
                tokio::spawn(async move { enrich_one(gateway.as_ref(), &text).await });

            let joined = tokio::select! {
                joined = &mut handle => joined,
                _ = cancel.cancelled() => {
                    handle.abort();
                    handle.await
                }
            };

            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!(row = idx, error = %e, "enrichment task failed");
                    EnrichmentResult::failed()
                }
            };

            (idx, result)
        }
    }))
    .buffer_unordered(workers);

    while let Some((idx, result)) = completions.next().await {
        results[idx] = Some(result);
    }
    drop(completions);

    rows.into_iter()
        .zip(results)
        .map(|(row, result)| {
            EnrichedRow::join(row, result.unwrap_or_else(EnrichmentResult::failed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefix_truncates_on_char_boundary() {
        let short = "quick note";
        assert_eq!(text_prefix(short), short);

        let long = "á".repeat(LOG_PREFIX_CHARS + 10);
        let prefix = text_prefix(&long);
        assert!(prefix.ends_with("..."));
        assert_eq!(
            prefix.chars().count(),
            LOG_PREFIX_CHARS + 3,
            "prefix must be capped at {} chars plus the ellipsis",
            LOG_PREFIX_CHARS
        );
    }
}
