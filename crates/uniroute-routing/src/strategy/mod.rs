//! Provider selection strategies
//!
//! The five strategies form a closed set, dispatched through
//! [`RoutingStrategy`]. Every strategy fails only on an empty candidate set.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use uniroute_config::StrategyType;
use uniroute_llm::{ChatRequest, Provider};

use crate::cost::CostCalculator;
use crate::error::RoutingError;
use crate::latency::LatencyTracker;
use crate::rules::{CustomRule, RoutingRule};

pub mod balanced;
pub mod cost;
pub mod custom;
pub mod latency;
pub mod model;

pub use balanced::LoadBalancedStrategy;
pub use cost::CostBasedStrategy;
pub use custom::CustomStrategy;
pub use latency::LatencyBasedStrategy;
pub use model::ModelBasedStrategy;

/// Selection strategy, one variant per [`StrategyType`]
#[derive(Debug, Clone)]
pub enum RoutingStrategy {
    /// Match the requested model against provider model lists
    ModelBased(ModelBasedStrategy),
    /// Cheapest provider serving the model
    CostBased(CostBasedStrategy),
    /// Fastest provider serving the model
    LatencyBased(LatencyBasedStrategy),
    /// Round-robin across providers serving the model
    LoadBalanced(LoadBalancedStrategy),
    /// Priority-ordered custom rules
    Custom(CustomStrategy),
}

impl RoutingStrategy {
    /// Pick one provider from `candidates` for `request`
    pub fn select_provider(
        &self,
        request: &ChatRequest,
        candidates: &[Arc<dyn Provider>],
    ) -> Result<Arc<dyn Provider>, RoutingError> {
        if candidates.is_empty() {
            return Err(RoutingError::NoProviders);
        }

        let selected = match self {
            Self::ModelBased(strategy) => strategy.select(request, candidates),
            Self::CostBased(strategy) => strategy.select(request, candidates),
            Self::LatencyBased(strategy) => strategy.select(request, candidates),
            Self::LoadBalanced(strategy) => strategy.select(request, candidates),
            Self::Custom(strategy) => strategy.select(request, candidates),
        };

        let selected = Arc::clone(selected);

        tracing::debug!(
            strategy = %self.strategy_type(),
            model = %request.model,
            provider = %selected.name(),
            candidates = candidates.len(),
            "provider selected"
        );

        Ok(selected)
    }

    /// Type tag of this strategy
    pub const fn strategy_type(&self) -> StrategyType {
        match self {
            Self::ModelBased(_) => StrategyType::ModelBased,
            Self::CostBased(_) => StrategyType::CostBased,
            Self::LatencyBased(_) => StrategyType::LatencyBased,
            Self::LoadBalanced(_) => StrategyType::LoadBalanced,
            Self::Custom(_) => StrategyType::Custom,
        }
    }
}

/// Build strategies bound to shared routing signals
///
/// The round-robin counter lives here so rotation carries over between
/// the per-request strategy instances the router builds.
#[derive(Debug, Clone)]
pub struct StrategyFactory {
    costs: Arc<CostCalculator>,
    latency: Arc<LatencyTracker>,
    rotation: Arc<AtomicUsize>,
}

impl StrategyFactory {
    /// Factory over the given cost and latency signals
    pub fn new(costs: Arc<CostCalculator>, latency: Arc<LatencyTracker>) -> Self {
        Self {
            costs,
            latency,
            rotation: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Strategy for `strategy_type`; `Custom` carries no rules and defers to model matching
    pub fn build(&self, strategy_type: StrategyType) -> RoutingStrategy {
        match strategy_type {
            StrategyType::ModelBased => RoutingStrategy::ModelBased(ModelBasedStrategy),
            StrategyType::CostBased => RoutingStrategy::CostBased(CostBasedStrategy::new(Arc::clone(&self.costs))),
            StrategyType::LatencyBased => {
                RoutingStrategy::LatencyBased(LatencyBasedStrategy::new(Arc::clone(&self.latency)))
            }
            StrategyType::LoadBalanced => {
                RoutingStrategy::LoadBalanced(LoadBalancedStrategy::with_counter(Arc::clone(&self.rotation)))
            }
            StrategyType::Custom => RoutingStrategy::Custom(CustomStrategy::default()),
        }
    }

    /// Custom strategy from stored rules, compiled against the live signals
    pub fn custom(&self, rules: &[CustomRule]) -> RoutingStrategy {
        let compiled: Vec<RoutingRule> = rules.iter().map(|r| r.compile(&self.costs, &self.latency)).collect();
        RoutingStrategy::Custom(CustomStrategy::new(compiled))
    }

    /// Pricing table shared with cost-aware strategies
    pub const fn costs(&self) -> &Arc<CostCalculator> {
        &self.costs
    }

    /// Latency history shared with latency-aware strategies
    pub const fn latency(&self) -> &Arc<LatencyTracker> {
        &self.latency
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use uniroute_llm::{ChatResponse, LlmError, RequestContext};

    use super::*;

    pub struct StubProvider {
        name: String,
        models: Vec<String>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn models(&self) -> Vec<String> {
            self.models.clone()
        }

        async fn chat(&self, _request: &ChatRequest, _context: &RequestContext) -> Result<ChatResponse, LlmError> {
            Err(LlmError::Unavailable {
                provider: self.name.clone(),
            })
        }

        async fn health_check(&self, _context: &RequestContext) -> Result<(), LlmError> {
            Ok(())
        }
    }

    pub fn provider(name: &str, models: &[&str]) -> Arc<dyn Provider> {
        Arc::new(StubProvider {
            name: name.to_owned(),
            models: models.iter().map(|m| (*m).to_owned()).collect(),
        })
    }

    pub fn request(model: &str) -> ChatRequest {
        ChatRequest::new(model, vec![uniroute_llm::Message::user("hello there")])
    }

    pub fn names(selected: &[Arc<dyn Provider>]) -> Vec<&str> {
        selected.iter().map(|p| p.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{provider, request};
    use super::*;

    fn factory() -> StrategyFactory {
        StrategyFactory::new(Arc::new(CostCalculator::new()), Arc::new(LatencyTracker::default()))
    }

    #[test]
    fn every_strategy_rejects_empty_candidates() {
        let factory = factory();
        for strategy_type in [
            StrategyType::ModelBased,
            StrategyType::CostBased,
            StrategyType::LatencyBased,
            StrategyType::LoadBalanced,
            StrategyType::Custom,
        ] {
            let strategy = factory.build(strategy_type);
            assert_eq!(strategy.strategy_type(), strategy_type);
            assert!(matches!(
                strategy.select_provider(&request("gpt-4"), &[]),
                Err(RoutingError::NoProviders)
            ));
        }
    }

    #[test]
    fn single_exact_match_wins_for_cost_and_latency() {
        let factory = factory();
        let candidates = [
            provider("anthropic", &["claude-3-haiku-20240307"]),
            provider("openai", &["gpt-4"]),
            provider("google", &["gemini-pro"]),
        ];

        for strategy_type in [StrategyType::CostBased, StrategyType::LatencyBased] {
            let selected = factory
                .build(strategy_type)
                .select_provider(&request("gpt-4"), &candidates)
                .unwrap();
            assert_eq!(selected.name(), "openai", "{strategy_type}");
        }

        // Sole serving provider has no pricing entry
        let candidates = [provider("alpha", &["x"]), provider("beta", &["m"])];
        for strategy_type in [StrategyType::CostBased, StrategyType::LatencyBased] {
            let selected = factory
                .build(strategy_type)
                .select_provider(&request("m"), &candidates)
                .unwrap();
            assert_eq!(selected.name(), "beta", "{strategy_type}");
        }
    }

    #[test]
    fn rotation_survives_rebuilds() {
        let factory = factory();
        let candidates = [provider("a", &["m"]), provider("b", &["m"])];

        let first = factory.build(StrategyType::LoadBalanced);
        let second = factory.build(StrategyType::LoadBalanced);

        let picked = [
            first.select_provider(&request("m"), &candidates).unwrap(),
            second.select_provider(&request("m"), &candidates).unwrap(),
        ];
        assert_eq!(super::test_support::names(&picked), vec!["a", "b"]);
    }

    #[test]
    fn custom_from_rules() {
        let factory = factory();
        let candidates = [provider("p1", &["x"]), provider("p2", &["m1", "m2"])];
        let strategy = factory.custom(&[CustomRule::model("m1", "p1", 10)]);

        let selected = strategy.select_provider(&request("m1"), &candidates).unwrap();
        assert_eq!(selected.name(), "p1");

        let selected = strategy.select_provider(&request("m2"), &candidates).unwrap();
        assert_eq!(selected.name(), "p2");
    }
}
