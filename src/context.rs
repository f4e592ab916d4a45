//! Application context with an explicit lifecycle.
//!
//! [`AppContext::initialize`] wires configuration, prompts, and the gateway
//! together exactly once at startup; call sites receive the context by
//! reference. There are no process-wide lazy singletons: whoever constructs
//! the context owns its lifetime.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::config::{load_config, Config};
use crate::enrich;
use crate::gateway::{AiGateway, OpenAiGateway};
use crate::index::VectorIndex;
use crate::models::{EnrichedRow, FeedbackRow};
use crate::prompts::{load_prompts, PromptSet};
use crate::rag::Answerer;

pub struct AppContext {
    pub config: Config,
    pub prompts: PromptSet,
    gateway: Arc<dyn AiGateway>,
}

impl AppContext {
    /// Load configuration and prompts and construct the gateway.
    ///
    /// Any missing file, key, placeholder, or credential is fatal here,
    /// before any pipeline work starts; no component runs half-configured.
    pub fn initialize(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)?;
        let prompts = load_prompts(&config.prompts.path)?;
        let gateway: Arc<dyn AiGateway> =
            Arc::new(OpenAiGateway::new(&config.gateway, &prompts.analysis_prompt)?);

        Ok(Self {
            config,
            prompts,
            gateway,
        })
    }

    /// Context over an explicit gateway, for callers that bring their own
    /// (tests, alternative providers).
    pub fn with_gateway(config: Config, prompts: PromptSet, gateway: Arc<dyn AiGateway>) -> Self {
        Self {
            config,
            prompts,
            gateway,
        }
    }

    pub fn gateway(&self) -> Arc<dyn AiGateway> {
        Arc::clone(&self.gateway)
    }

    /// Run the concurrent enrichment pipeline with this context's worker
    /// bound.
    pub async fn enrich_rows(
        &self,
        rows: Vec<FeedbackRow>,
        cancel: &CancellationToken,
    ) -> Vec<EnrichedRow> {
        enrich::enrich_all(
            self.gateway(),
            rows,
            self.config.enrichment.workers,
            cancel,
        )
        .await
    }

    /// Build the vector index for this context's collection. The index
    /// dimensionality always matches the gateway's, so query embeddings are
    /// comparable by construction.
    ///
    /// The returned index is plain data owned by the caller. Rebuilding
    /// while serving queries requires wrapping it in an `RwLock` (single
    /// writer, many readers).
    pub fn build_index(&self, rows: &[EnrichedRow]) -> VectorIndex {
        VectorIndex::build(&self.config.index.collection, self.gateway.dims(), rows)
    }

    pub fn answerer(&self) -> Answerer {
        Answerer::new(
            self.gateway(),
            self.prompts.clone(),
            self.config.retrieval.top_k,
            self.config.retrieval.max_context_chars,
        )
    }
}
