//! Selection error types

use thiserror::Error;

/// Errors raised while selecting a provider
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The candidate set was empty
    #[error("no providers available")]
    NoProviders,
}
