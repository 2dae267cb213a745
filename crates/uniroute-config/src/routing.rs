use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default number of latency samples kept per provider
pub const DEFAULT_LATENCY_SAMPLES: usize = 100;

/// Default capacity of the streaming chunk channel
pub const DEFAULT_STREAM_BUFFER: usize = 100;

/// Routing engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Server default strategy
    #[serde(default)]
    pub strategy: StrategyType,
    /// Latency samples retained per provider
    #[serde(default = "default_latency_samples")]
    pub latency_samples: usize,
    /// Capacity of the chunk channel handed to streaming callers
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
    /// Report a stream that ends without output or error as a failure
    #[serde(default = "default_true")]
    pub empty_stream_is_error: bool,
    /// Only attempt the strategy's pick when it is not among the available providers
    #[serde(default)]
    pub strict_selection: bool,
    /// Bring-your-own-key settings
    #[serde(default)]
    pub byok: ByokConfig,
    /// Pricing overrides applied on top of the built-in table
    #[serde(default)]
    pub pricing: Vec<PricingConfig>,
    /// Server-wide custom rules used by the custom strategy
    #[serde(default)]
    pub rules: Vec<CustomRuleConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::default(),
            latency_samples: DEFAULT_LATENCY_SAMPLES,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            empty_stream_is_error: true,
            strict_selection: false,
            byok: ByokConfig::default(),
            pricing: Vec::new(),
            rules: Vec::new(),
        }
    }
}

/// Provider selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyType {
    /// Match the requested model against provider model lists
    #[default]
    #[serde(rename = "model")]
    #[strum(serialize = "model")]
    ModelBased,
    /// Cheapest provider serving the model
    #[serde(rename = "cost")]
    #[strum(serialize = "cost")]
    CostBased,
    /// Fastest provider serving the model
    #[serde(rename = "latency")]
    #[strum(serialize = "latency")]
    LatencyBased,
    /// Round-robin across providers serving the model
    #[serde(rename = "balanced")]
    #[strum(serialize = "balanced")]
    LoadBalanced,
    /// Priority-ordered custom rules
    Custom,
}

/// Bring-your-own-key settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ByokConfig {
    /// Provider names checked for caller credentials, in order
    #[serde(default = "default_byok_providers")]
    pub providers: Vec<String>,
}

impl Default for ByokConfig {
    fn default() -> Self {
        Self {
            providers: default_byok_providers(),
        }
    }
}

/// Pricing override for one provider/model pair
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Provider name
    pub provider: String,
    /// Model identifier
    pub model: String,
    /// Cost per million input tokens (USD)
    pub input_per_mtok: f64,
    /// Cost per million output tokens (USD)
    pub output_per_mtok: f64,
}

/// Declarative custom routing rule
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRuleConfig {
    /// Condition type (`model`, `cost_threshold`, `latency_threshold`)
    pub condition: String,
    /// Condition parameters
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Provider selected when the condition holds
    pub provider: String,
    /// Higher priority rules are evaluated first
    #[serde(default)]
    pub priority: i32,
}

const fn default_latency_samples() -> usize {
    DEFAULT_LATENCY_SAMPLES
}

const fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

fn default_byok_providers() -> Vec<String> {
    ["openai", "anthropic", "google"].map(str::to_owned).to_vec()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn strategy_type_string_forms() {
        assert_eq!(StrategyType::ModelBased.to_string(), "model");
        assert_eq!(StrategyType::LoadBalanced.to_string(), "balanced");
        assert_eq!(StrategyType::from_str("latency").unwrap(), StrategyType::LatencyBased);
        assert_eq!(StrategyType::from_str("custom").unwrap(), StrategyType::Custom);
        assert!(StrategyType::from_str("fastest").is_err());
    }

    #[test]
    fn routing_defaults() {
        let config: RoutingConfig = toml::from_str("").unwrap();
        assert_eq!(config.strategy, StrategyType::ModelBased);
        assert_eq!(config.latency_samples, DEFAULT_LATENCY_SAMPLES);
        assert_eq!(config.stream_buffer, DEFAULT_STREAM_BUFFER);
        assert!(config.empty_stream_is_error);
        assert!(!config.strict_selection);
        assert_eq!(config.byok.providers, vec!["openai", "anthropic", "google"]);
    }

    #[test]
    fn parses_rules_and_pricing() {
        let config: RoutingConfig = toml::from_str(
            r#"
            strategy = "custom"

            [[pricing]]
            provider = "openai"
            model = "gpt-4o"
            input_per_mtok = 2.5
            output_per_mtok = 10.0

            [[rules]]
            condition = "model"
            provider = "anthropic"
            priority = 10
            params = { model = "claude-3-haiku-20240307" }
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyType::Custom);
        assert_eq!(config.pricing.len(), 1);
        assert_eq!(config.rules[0].provider, "anthropic");
        assert_eq!(config.rules[0].params["model"], "claude-3-haiku-20240307");
    }
}
