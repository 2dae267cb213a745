//! Round-robin selection

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use uniroute_llm::{ChatRequest, Provider};

/// Rotate across providers serving the model, or across all candidates when none do
#[derive(Debug, Clone, Default)]
pub struct LoadBalancedStrategy {
    counter: Arc<AtomicUsize>,
}

impl LoadBalancedStrategy {
    /// Strategy with its own rotation counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy sharing an existing rotation counter
    pub const fn with_counter(counter: Arc<AtomicUsize>) -> Self {
        Self { counter }
    }

    pub(crate) fn select<'a>(&self, request: &ChatRequest, candidates: &'a [Arc<dyn Provider>]) -> &'a Arc<dyn Provider> {
        let serving: Vec<&'a Arc<dyn Provider>> = candidates.iter().filter(|p| p.serves(&request.model)).collect();
        let pool: Vec<&'a Arc<dyn Provider>> = if serving.is_empty() {
            candidates.iter().collect()
        } else {
            serving
        };

        let turn = self.counter.fetch_add(1, Ordering::Relaxed);
        pool[turn % pool.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{names, provider, request};
    use super::*;

    #[test]
    fn consecutive_selections_rotate() {
        let strategy = LoadBalancedStrategy::new();
        let candidates = [provider("p1", &["m"]), provider("p2", &["m"]), provider("p3", &["m"])];

        let picked: Vec<Arc<dyn Provider>> = (0..3)
            .map(|_| Arc::clone(strategy.select(&request("m"), &candidates)))
            .collect();

        assert_eq!(names(&picked), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn only_serving_providers_take_turns() {
        let strategy = LoadBalancedStrategy::new();
        let candidates = [provider("p1", &["m"]), provider("p2", &["other"]), provider("p3", &["m"])];

        let picked: Vec<Arc<dyn Provider>> = (0..4)
            .map(|_| Arc::clone(strategy.select(&request("m"), &candidates)))
            .collect();

        assert_eq!(names(&picked), vec!["p1", "p3", "p1", "p3"]);
    }

    #[test]
    fn rotates_over_everything_without_a_match() {
        let strategy = LoadBalancedStrategy::new();
        let candidates = [provider("p1", &["a"]), provider("p2", &["b"])];

        let picked: Vec<Arc<dyn Provider>> = (0..2)
            .map(|_| Arc::clone(strategy.select(&request("c"), &candidates)))
            .collect();

        assert_eq!(names(&picked), vec!["p1", "p2"]);
    }
}
