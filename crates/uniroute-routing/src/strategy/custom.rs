//! Priority-ordered custom rules

use std::sync::Arc;

use uniroute_llm::{ChatRequest, Provider};

use super::model::ModelBasedStrategy;
use crate::rules::RoutingRule;

/// Evaluate rules from highest to lowest priority, deferring to model matching
///
/// A matching rule whose provider is not among the candidates is skipped.
#[derive(Debug, Clone, Default)]
pub struct CustomStrategy {
    rules: Vec<RoutingRule>,
}

impl CustomStrategy {
    /// Strategy over `rules`, stably sorted by descending priority
    pub fn new(mut rules: Vec<RoutingRule>) -> Self {
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
        Self { rules }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub(crate) fn select<'a>(&self, request: &ChatRequest, candidates: &'a [Arc<dyn Provider>]) -> &'a Arc<dyn Provider> {
        let matched = self
            .rules
            .iter()
            .filter(|rule| rule.matches(request))
            .find_map(|rule| candidates.iter().find(|p| p.name() == rule.provider));

        if let Some(provider) = matched {
            return provider;
        }

        ModelBasedStrategy.select(request, candidates)
    }
}
