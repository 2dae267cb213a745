//! Cheapest provider by estimated request cost

use std::sync::Arc;

use uniroute_llm::{ChatRequest, Provider};

use crate::cost::CostCalculator;

/// Select the provider with the lowest estimated cost among exact model matches
///
/// The first serving provider is the baseline and is replaced only by a
/// strictly cheaper one, so providers priced at
/// [`UNKNOWN_PROVIDER_COST`](crate::cost::UNKNOWN_PROVIDER_COST)
/// lose to any priced provider but still win when they alone serve the
/// model. When nothing serves the model the first candidate is returned.
#[derive(Debug, Clone)]
pub struct CostBasedStrategy {
    costs: Arc<CostCalculator>,
}

impl CostBasedStrategy {
    /// Strategy over a shared pricing table
    pub const fn new(costs: Arc<CostCalculator>) -> Self {
        Self { costs }
    }

    pub(crate) fn select<'a>(&self, request: &ChatRequest, candidates: &'a [Arc<dyn Provider>]) -> &'a Arc<dyn Provider> {
        let mut cheapest: Option<(f64, &'a Arc<dyn Provider>)> = None;

        for provider in candidates.iter().filter(|p| p.serves(&request.model)) {
            let cost = self.costs.estimate_cost(provider.name(), request);
            if cheapest.is_none_or(|(lowest, _)| cost < lowest) {
                cheapest = Some((cost, provider));
            }
        }

        cheapest.map_or(&candidates[0], |(_, provider)| provider)
    }
}
