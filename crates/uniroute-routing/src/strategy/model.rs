//! Model-name matching
//!
//! Exact (case-insensitive) match first, then substring in either
//! direction so `llama2` finds `llama2:7b`, then local-family keywords
//! steer toward the `local` provider, then the first candidate.

use std::sync::Arc;

use uniroute_llm::{ChatRequest, Provider};

/// Name of the provider serving locally hosted models
pub const LOCAL_PROVIDER: &str = "local";

/// Model-name fragments that identify locally hosted model families
const LOCAL_MODEL_KEYWORDS: &[&str] = &["llama", "mistral", "phi", "codellama", "neural", "orca"];

/// Select by matching the requested model against provider model lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBasedStrategy;

impl ModelBasedStrategy {
    /// Pick from a non-empty candidate list
    pub(crate) fn select<'a>(&self, request: &ChatRequest, candidates: &'a [Arc<dyn Provider>]) -> &'a Arc<dyn Provider> {
        let wanted = request.model.to_lowercase();

        let lowered_models = |provider: &Arc<dyn Provider>| -> Vec<String> {
            provider.models().iter().map(|m| m.to_lowercase()).collect()
        };

        if let Some(provider) = candidates
            .iter()
            .find(|p| lowered_models(p).iter().any(|m| *m == wanted))
        {
            return provider;
        }

        if let Some(provider) = candidates.iter().find(|p| {
            lowered_models(p)
                .iter()
                .any(|m| m.contains(&wanted) || wanted.contains(m.as_str()))
        }) {
            return provider;
        }

        if LOCAL_MODEL_KEYWORDS.iter().any(|k| wanted.contains(k))
            && let Some(local) = candidates.iter().find(|p| p.name() == LOCAL_PROVIDER)
        {
            return local;
        }

        &candidates[0]
    }
}
