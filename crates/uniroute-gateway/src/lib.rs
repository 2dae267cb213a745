//! Request routing and dispatch for UniRoute
//!
//! The [`Router`] owns the registered providers, resolves the effective
//! strategy per caller, substitutes caller-owned (BYOK) providers when the
//! caller has keys, and dispatches with sequential failover.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod byok;
pub mod error;
mod registry;
mod router;
pub mod services;
mod stream;

pub use byok::ByokResolver;
pub use error::GatewayError;
pub use registry::ProviderRegistry;
pub use router::Router;
pub use services::{
    CustomRuleStore, ProviderFactory, ProviderKeyStore, RoutingPolicyService, Services, UserPreferenceService,
};
pub use stream::RoutedStream;
