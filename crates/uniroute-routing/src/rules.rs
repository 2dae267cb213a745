//! Declarative custom routing rules
//!
//! A [`CustomRule`] is the stored form (condition name plus loosely typed
//! parameters). Compiling it yields a [`RoutingRule`] whose [`Condition`]
//! is evaluated against each request. Anything malformed compiles to
//! [`Condition::Never`].

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use uniroute_config::CustomRuleConfig;
use uniroute_llm::ChatRequest;

use crate::cost::CostCalculator;
use crate::latency::LatencyTracker;

/// Condition name matching the request model exactly
pub const CONDITION_MODEL: &str = "model";

/// Condition name bounding the estimated request cost
pub const CONDITION_COST_THRESHOLD: &str = "cost_threshold";

/// Condition name bounding the provider's average latency
pub const CONDITION_LATENCY_THRESHOLD: &str = "latency_threshold";

/// Stored custom rule, as loaded from configuration or a rule store
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRule {
    /// Condition type (`model`, `cost_threshold`, `latency_threshold`)
    pub condition: String,
    /// Condition parameters (`model`, `max_cost`, `max_latency_ms`)
    pub params: Map<String, Value>,
    /// Provider selected when the condition holds
    pub provider: String,
    /// Higher priority rules are evaluated first
    pub priority: i32,
}

impl From<&CustomRuleConfig> for CustomRule {
    fn from(config: &CustomRuleConfig) -> Self {
        Self {
            condition: config.condition.clone(),
            params: config.params.clone(),
            provider: config.provider.clone(),
            priority: config.priority,
        }
    }
}

impl CustomRule {
    /// Rule routing requests for `model` to `provider`
    pub fn model(model: &str, provider: &str, priority: i32) -> Self {
        Self::with_param(CONDITION_MODEL, "model", Value::from(model), provider, priority)
    }

    /// Rule routing to `provider` while its estimated cost stays at or below `max_cost`
    pub fn cost_threshold(max_cost: f64, provider: &str, priority: i32) -> Self {
        Self::with_param(CONDITION_COST_THRESHOLD, "max_cost", Value::from(max_cost), provider, priority)
    }

    /// Rule routing to `provider` while its average latency stays at or below `max_latency_ms`
    pub fn latency_threshold(max_latency_ms: u64, provider: &str, priority: i32) -> Self {
        Self::with_param(
            CONDITION_LATENCY_THRESHOLD,
            "max_latency_ms",
            Value::from(max_latency_ms),
            provider,
            priority,
        )
    }

    fn with_param(condition: &str, key: &str, value: Value, provider: &str, priority: i32) -> Self {
        let mut params = Map::new();
        params.insert(key.to_owned(), value);

        Self {
            condition: condition.to_owned(),
            params,
            provider: provider.to_owned(),
            priority,
        }
    }

    /// Compile into an evaluable rule bound to the live cost and latency signals
    pub fn compile(&self, costs: &Arc<CostCalculator>, latency: &Arc<LatencyTracker>) -> RoutingRule {
        let condition = match self.condition.as_str() {
            CONDITION_MODEL => self
                .params
                .get("model")
                .and_then(Value::as_str)
                .map(|model| Condition::ModelEquals(model.to_owned())),
            CONDITION_COST_THRESHOLD => self
                .params
                .get("max_cost")
                .and_then(Value::as_f64)
                .map(|max_cost| Condition::CostAtMost {
                    max_cost,
                    costs: Arc::clone(costs),
                }),
            CONDITION_LATENCY_THRESHOLD => self
                .params
                .get("max_latency_ms")
                .and_then(Value::as_f64)
                .map(|max_latency_ms| Condition::LatencyAtMost {
                    max_latency_ms: max_latency_ms.trunc(),
                    latency: Arc::clone(latency),
                }),
            _ => None,
        };

        let condition = condition.unwrap_or_else(|| {
            tracing::warn!(
                condition = %self.condition,
                provider = %self.provider,
                "custom rule is malformed and will never match"
            );
            Condition::Never
        });

        RoutingRule {
            provider: self.provider.clone(),
            priority: self.priority,
            condition,
        }
    }
}

/// Predicate over a request
#[derive(Clone)]
pub enum Condition {
    /// Request model equals the value exactly
    ModelEquals(String),
    /// Estimated cost on the rule's provider is at most `max_cost`
    CostAtMost {
        /// Threshold in USD
        max_cost: f64,
        /// Live pricing table
        costs: Arc<CostCalculator>,
    },
    /// Average latency of the rule's provider, in whole milliseconds, is at most the threshold
    LatencyAtMost {
        /// Threshold in whole milliseconds
        max_latency_ms: f64,
        /// Live latency history
        latency: Arc<LatencyTracker>,
    },
    /// Arbitrary programmatic predicate
    Predicate(Arc<dyn Fn(&ChatRequest) -> bool + Send + Sync>),
    /// Never matches
    Never,
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelEquals(model) => f.debug_tuple("ModelEquals").field(model).finish(),
            Self::CostAtMost { max_cost, .. } => f.debug_struct("CostAtMost").field("max_cost", max_cost).finish(),
            Self::LatencyAtMost { max_latency_ms, .. } => f
                .debug_struct("LatencyAtMost")
                .field("max_latency_ms", max_latency_ms)
                .finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Never => f.write_str("Never"),
        }
    }
}

/// Compiled rule evaluated by the custom strategy
#[derive(Debug, Clone)]
pub struct RoutingRule {
    /// Provider selected when the condition holds
    pub provider: String,
    /// Higher priority rules are evaluated first
    pub priority: i32,
    /// Predicate over the request
    pub condition: Condition,
}

impl RoutingRule {
    /// Rule driven by an arbitrary predicate
    pub fn predicate<F>(provider: &str, priority: i32, predicate: F) -> Self
    where
        F: Fn(&ChatRequest) -> bool + Send + Sync + 'static,
    {
        Self {
            provider: provider.to_owned(),
            priority,
            condition: Condition::Predicate(Arc::new(predicate)),
        }
    }

    /// Whether the condition holds for `request`
    #[allow(clippy::cast_precision_loss)]
    pub fn matches(&self, request: &ChatRequest) -> bool {
        match &self.condition {
            Condition::ModelEquals(model) => request.model == *model,
            Condition::CostAtMost { max_cost, costs } => {
                costs.estimate_cost(&self.provider, request) <= *max_cost
            }
            Condition::LatencyAtMost { max_latency_ms, latency } => {
                latency.average(&self.provider).as_millis() as f64 <= *max_latency_ms
            }
            Condition::Predicate(predicate) => predicate(request),
            Condition::Never => false,
        }
    }
}
