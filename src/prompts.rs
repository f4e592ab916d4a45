//! Prompt template loading and rendering.
//!
//! Two templates drive the gateway's language-model calls:
//!
//! - `analysis_prompt`: system prompt instructing the classification call to
//!   emit a JSON object with exactly a `sentimento` field and a `topico`
//!   field.
//! - `answer_prompt`: generation template with `{context}` and `{question}`
//!   placeholders.
//!
//! Both live in one TOML file referenced from `[prompts] path` in the
//! config. A missing file, a missing key, or a template without its
//! placeholders is fatal at load time.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const CONTEXT_SLOT: &str = "{context}";
pub const QUESTION_SLOT: &str = "{question}";

#[derive(Debug, Clone, Deserialize)]
pub struct PromptSet {
    pub analysis_prompt: String,
    pub answer_prompt: String,
}

impl PromptSet {
    /// Render the answer prompt with the retrieved context block and the
    /// user's question.
    pub fn render_answer(&self, context: &str, question: &str) -> String {
        self.answer_prompt
            .replace(CONTEXT_SLOT, context)
            .replace(QUESTION_SLOT, question)
    }
}

pub fn load_prompts(path: &Path) -> Result<PromptSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

    let prompts: PromptSet =
        toml::from_str(&content).with_context(|| "Failed to parse prompt file")?;

    if prompts.analysis_prompt.trim().is_empty() {
        bail!("analysis_prompt must not be empty");
    }
    for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
        if !prompts.answer_prompt.contains(slot) {
            bail!("answer_prompt is missing the {} placeholder", slot);
        }
    }

    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_answer_substitutes_both_slots() {
        let prompts = PromptSet {
            analysis_prompt: "classify".to_string(),
            answer_prompt: "Context:\n{context}\n\nQuestion: {question}\nAnswer:".to_string(),
        };

        let rendered = prompts.render_answer("doc one\n\ndoc two", "Which supplier was worst?");
        assert!(rendered.contains("doc one\n\ndoc two"));
        assert!(rendered.contains("Which supplier was worst?"));
        assert!(!rendered.contains(CONTEXT_SLOT));
        assert!(!rendered.contains(QUESTION_SLOT));
    }
}
