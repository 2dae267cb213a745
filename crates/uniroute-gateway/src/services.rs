//! Collaborator services consulted while routing
//!
//! Each service is optional. Failures are logged by the router and treated
//! as "no answer", never surfaced to the caller.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use uniroute_llm::{CallerId, Provider, RequestContext};
use uniroute_routing::CustomRule;

/// Administrative routing policy
#[async_trait]
pub trait RoutingPolicyService: Send + Sync {
    /// Whether callers are barred from overriding the default strategy
    async fn is_locked(&self, context: &RequestContext) -> anyhow::Result<bool>;

    /// Server default strategy name (`model`, `cost`, `latency`, `balanced`, `custom`)
    async fn default_strategy(&self, context: &RequestContext) -> anyhow::Result<String>;
}

/// Per-caller strategy preferences
#[async_trait]
pub trait UserPreferenceService: Send + Sync {
    /// Preferred strategy name, if the caller stored one
    async fn preference(&self, context: &RequestContext, caller: CallerId) -> anyhow::Result<Option<String>>;
}

/// Source of active custom routing rules
#[async_trait]
pub trait CustomRuleStore: Send + Sync {
    /// Active rules for `caller`, or the global rules when `caller` is `None`
    async fn active_rules(&self, context: &RequestContext, caller: Option<CallerId>)
    -> anyhow::Result<Vec<CustomRule>>;
}

/// Caller-owned provider credentials
#[async_trait]
pub trait ProviderKeyStore: Send + Sync {
    /// Stored credential for `provider`, if any
    async fn key(
        &self,
        context: &RequestContext,
        caller: CallerId,
        provider: &str,
    ) -> anyhow::Result<Option<SecretString>>;
}

/// Constructs live providers bound to a caller's credential
pub trait ProviderFactory: Send + Sync {
    /// Provider named `provider` using `credential`, or `None` if the name is not buildable
    fn build(&self, provider: &str, credential: &SecretString) -> Option<Arc<dyn Provider>>;
}

/// Collaborators wired into a [`crate::Router`]
#[derive(Clone, Default)]
pub struct Services {
    /// Administrative lock and default strategy
    pub policy: Option<Arc<dyn RoutingPolicyService>>,
    /// Per-caller strategy preferences
    pub preferences: Option<Arc<dyn UserPreferenceService>>,
    /// Per-caller custom rules
    pub rules: Option<Arc<dyn CustomRuleStore>>,
    /// Caller-owned credentials, required for BYOK
    pub keys: Option<Arc<dyn ProviderKeyStore>>,
    /// Builds BYOK providers, required for BYOK
    pub factory: Option<Arc<dyn ProviderFactory>>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("policy", &self.policy.is_some())
            .field("preferences", &self.preferences.is_some())
            .field("rules", &self.rules.is_some())
            .field("keys", &self.keys.is_some())
            .field("factory", &self.factory.is_some())
            .finish()
    }
}
