//! Retrieval-augmented answering over the vector index.
//!
//! [`Answerer::answer`] runs the linear query flow: embed the question,
//! retrieve the top-k most similar documents, assemble a bounded context
//! block, and generate an answer conditioned on it. It fails soft: every
//! internal error becomes a fixed user-facing reply with an empty source
//! list, never an error to the caller.
//!
//! Two distinct absorbing failure states exist so callers can tell them
//! apart: [`NO_CONTEXT_REPLY`] (no usable retrieval context, generation
//! never attempted) and [`GENERATION_FAILED_REPLY`] (context was found but
//! the generation call failed). Generation without retrieved context is
//! deliberately disallowed: an unanchored completion would fabricate
//! answers.

use std::sync::Arc;

use tracing::warn;

use crate::gateway::AiGateway;
use crate::index::{ScoredDocument, VectorIndex};
use crate::prompts::PromptSet;

/// Reply when the question cannot be matched against the corpus, either
/// because the query embedding failed or retrieval returned nothing.
pub const NO_CONTEXT_REPLY: &str =
    "I could not find relevant feedback to answer that question.";

/// Reply when context was retrieved but the generation call failed.
pub const GENERATION_FAILED_REPLY: &str =
    "Sorry, something went wrong while generating the answer. Please try again.";

/// Paragraph break between retrieved documents in the context block.
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Generated answer plus the documents that supported it. `sources` is
/// empty on every fail-soft path.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<ScoredDocument>,
}

impl AnswerResult {
    fn without_sources(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            sources: Vec::new(),
        }
    }
}

pub struct Answerer {
    gateway: Arc<dyn AiGateway>,
    prompts: PromptSet,
    top_k: usize,
    max_context_chars: usize,
}

impl Answerer {
    pub fn new(
        gateway: Arc<dyn AiGateway>,
        prompts: PromptSet,
        top_k: usize,
        max_context_chars: usize,
    ) -> Self {
        Self {
            gateway,
            prompts,
            top_k,
            max_context_chars,
        }
    }

    /// Answer a question over the index. Never fails.
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> AnswerResult {
        let query_vector = match self.gateway.embed(question).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "query embedding failed");
                return AnswerResult::without_sources(NO_CONTEXT_REPLY);
            }
        };

        let retrieved = index.query(&query_vector, self.top_k);
        if retrieved.is_empty() {
            return AnswerResult::without_sources(NO_CONTEXT_REPLY);
        }

        let (context, sources) = assemble_context(retrieved, self.max_context_chars);
        let prompt = self.prompts.render_answer(&context, question);

        match self.gateway.generate(&prompt).await {
            Ok(answer) => AnswerResult { answer, sources },
            Err(e) => {
                warn!(error = %e, "generation call failed");
                AnswerResult::without_sources(GENERATION_FAILED_REPLY)
            }
        }
    }
}

/// Concatenate retrieved documents under the char budget, keeping the
/// index's similarity order. The documents included in the block are
/// exactly the sources reported back to the caller. The most similar
/// document is always included, so a single oversized document cannot
/// produce an empty context.
fn assemble_context(
    retrieved: Vec<ScoredDocument>,
    max_chars: usize,
) -> (String, Vec<ScoredDocument>) {
    let mut block = String::new();
    let mut block_chars = 0usize;
    let mut included = Vec::new();

    for doc in retrieved {
        let doc_chars = doc.text.chars().count();
        if !included.is_empty()
            && block_chars + DOCUMENT_SEPARATOR.len() + doc_chars > max_chars
        {
            break;
        }

        if !included.is_empty() {
            block.push_str(DOCUMENT_SEPARATOR);
            block_chars += DOCUMENT_SEPARATOR.len();
        }
        block.push_str(&doc.text);
        block_chars += doc_chars;
        included.push(doc);
    }

    (block, included)
}
