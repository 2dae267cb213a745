//! Per-provider model pricing and request cost estimation
//!
//! Prices are expressed in USD per million tokens. Estimates use a
//! character heuristic (4 characters per token, output assumed to be half
//! the input); actual costs use the token counts reported by the provider.

use dashmap::DashMap;
use indexmap::IndexMap;
use uniroute_config::PricingConfig;
use uniroute_llm::{ChatRequest, Usage};

/// Cost reported for a provider with no pricing table at all
pub const UNKNOWN_PROVIDER_COST: f64 = 999_999.0;

/// Characters per estimated token
const CHARS_PER_TOKEN: f64 = 4.0;

/// Estimated output tokens as a fraction of input tokens
const OUTPUT_RATIO: f64 = 0.5;

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Price of one model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pricing {
    /// Cost per million input tokens (USD)
    pub input_per_mtok: f64,
    /// Cost per million output tokens (USD)
    pub output_per_mtok: f64,
}

impl Pricing {
    /// Pricing from per-million input and output rates
    pub const fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }

    #[allow(clippy::float_cmp)]
    fn is_free(&self) -> bool {
        self.input_per_mtok == 0.0 && self.output_per_mtok == 0.0
    }

    fn cost(&self, input_tokens: f64, output_tokens: f64) -> f64 {
        (input_tokens / TOKENS_PER_UNIT) * self.input_per_mtok + (output_tokens / TOKENS_PER_UNIT) * self.output_per_mtok
    }
}

const DEFAULT_PRICING: &[(&str, &[(&str, Pricing)])] = &[
    (
        "openai",
        &[
            ("gpt-4o", Pricing::new(5.0, 15.0)),
            ("gpt-4o-mini", Pricing::new(0.15, 0.6)),
            ("gpt-4", Pricing::new(30.0, 60.0)),
            ("gpt-4-turbo-preview", Pricing::new(10.0, 30.0)),
            ("gpt-3.5-turbo", Pricing::new(0.5, 1.5)),
            ("gpt-3.5-turbo-0125", Pricing::new(0.5, 1.5)),
        ],
    ),
    (
        "anthropic",
        &[
            ("claude-3-5-sonnet-20241022", Pricing::new(3.0, 15.0)),
            ("claude-3-opus-20240229", Pricing::new(15.0, 75.0)),
            ("claude-3-sonnet-20240229", Pricing::new(3.0, 15.0)),
            ("claude-3-haiku-20240307", Pricing::new(0.25, 1.25)),
        ],
    ),
    (
        "google",
        &[
            ("gemini-pro", Pricing::new(0.0, 0.0)),
            ("gemini-1.5-pro", Pricing::new(1.25, 5.0)),
            ("gemini-1.5-flash", Pricing::new(0.075, 0.30)),
        ],
    ),
    (
        "local",
        &[
            ("llama2", Pricing::new(0.0, 0.0)),
            ("mistral", Pricing::new(0.0, 0.0)),
            ("codellama", Pricing::new(0.0, 0.0)),
        ],
    ),
];

/// Pricing table keyed by provider, then model
///
/// Models keep their insertion order, so the entry borrowed for an
/// unpriced model is always the first one registered for that provider.
#[derive(Debug)]
pub struct CostCalculator {
    pricing: DashMap<String, IndexMap<String, Pricing>>,
}

impl Default for CostCalculator {
    fn default() -> Self {
        let pricing = DEFAULT_PRICING
            .iter()
            .map(|(provider, models)| {
                let models = models.iter().map(|(model, price)| ((*model).to_owned(), *price)).collect();
                ((*provider).to_owned(), models)
            })
            .collect();

        Self { pricing }
    }
}

impl CostCalculator {
    /// Calculator seeded with the built-in pricing table
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table with configured overrides applied on top
    pub fn from_config(overrides: &[PricingConfig]) -> Self {
        let calculator = Self::default();

        for entry in overrides {
            calculator.update_pricing(
                &entry.provider,
                &entry.model,
                Pricing::new(entry.input_per_mtok, entry.output_per_mtok),
            );
        }

        calculator
    }

    /// Estimate what sending `request` to `provider` would cost
    ///
    /// Unknown providers cost [`UNKNOWN_PROVIDER_COST`]. An unpriced model
    /// borrows the provider's first pricing entry.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_cost(&self, provider: &str, request: &ChatRequest) -> f64 {
        let Some(pricing) = self.pricing(provider, &request.model) else {
            return UNKNOWN_PROVIDER_COST;
        };

        if pricing.is_free() {
            return 0.0;
        }

        let input_tokens = request.text_len() as f64 / CHARS_PER_TOKEN;
        let output_tokens = input_tokens * OUTPUT_RATIO;

        pricing.cost(input_tokens, output_tokens)
    }

    /// Cost of a completed request from its reported usage, rounded to 4 decimals
    ///
    /// Providers without a pricing table cost nothing.
    pub fn calculate_actual_cost(&self, provider: &str, model: &str, usage: &Usage) -> f64 {
        let Some(pricing) = self.pricing(provider, model) else {
            return 0.0;
        };

        let cost = pricing.cost(f64::from(usage.prompt_tokens), f64::from(usage.completion_tokens));
        (cost * 10_000.0).round() / 10_000.0
    }

    /// Price for `provider`/`model`, borrowing the provider's first entry for unknown models
    pub fn pricing(&self, provider: &str, model: &str) -> Option<Pricing> {
        let models = self.pricing.get(provider)?;

        let pricing = models.get(model).or_else(|| models.values().next()).copied();
        Some(pricing.unwrap_or_default())
    }

    /// Set or replace the price of one model
    pub fn update_pricing(&self, provider: &str, model: &str, pricing: Pricing) {
        tracing::debug!(
            provider = %provider,
            model = %model,
            input_per_mtok = pricing.input_per_mtok,
            output_per_mtok = pricing.output_per_mtok,
            "pricing updated"
        );

        self.pricing
            .entry(provider.to_owned())
            .or_default()
            .insert(model.to_owned(), pricing);
    }
}
