#![allow(clippy::must_use_candidate)]

mod env;
mod loader;
pub mod routing;
pub mod telemetry;

use serde::Deserialize;

pub use routing::*;
pub use telemetry::TelemetryConfig;

/// Top-level UniRoute configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Routing engine configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
