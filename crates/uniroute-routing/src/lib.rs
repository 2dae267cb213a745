//! Provider selection for UniRoute
//!
//! Provides the five selection strategies and the signals they consume:
//! - **Model**: match the requested model against provider model lists
//! - **Cost**: cheapest provider by estimated request cost
//! - **Latency**: fastest provider by rolling average latency
//! - **Balanced**: round-robin across providers serving the model
//! - **Custom**: priority-ordered declarative rules

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod cost;
pub mod error;
pub mod latency;
pub mod rules;
pub mod strategy;

pub use cost::{CostCalculator, Pricing};
pub use error::RoutingError;
pub use latency::{LatencyStats, LatencyTracker};
pub use rules::{Condition, CustomRule, RoutingRule};
pub use strategy::{RoutingStrategy, StrategyFactory};
pub use uniroute_config::StrategyType;
