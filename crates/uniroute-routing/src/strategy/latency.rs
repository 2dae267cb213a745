//! Fastest provider by rolling average latency

use std::sync::Arc;
use std::time::Duration;

use uniroute_llm::{ChatRequest, Provider};

use crate::latency::LatencyTracker;

/// Upper bound no real average reaches
const LATENCY_CEILING: Duration = Duration::from_secs(999_999);

/// Select the provider with the lowest average latency among exact model matches
///
/// Untested providers count as the tracker's one-second default.
#[derive(Debug, Clone)]
pub struct LatencyBasedStrategy {
    latency: Arc<LatencyTracker>,
}

impl LatencyBasedStrategy {
    /// Strategy over a shared latency history
    pub const fn new(latency: Arc<LatencyTracker>) -> Self {
        Self { latency }
    }

    pub(crate) fn select<'a>(&self, request: &ChatRequest, candidates: &'a [Arc<dyn Provider>]) -> &'a Arc<dyn Provider> {
        let mut fastest = None;
        let mut lowest = LATENCY_CEILING;

        for provider in candidates.iter().filter(|p| p.serves(&request.model)) {
            let average = self.latency.average(provider.name());
            if average < lowest {
                lowest = average;
                fastest = Some(provider);
            }
        }

        fastest.unwrap_or(&candidates[0])
    }
}
