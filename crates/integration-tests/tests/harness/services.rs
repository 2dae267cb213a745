//! In-memory collaborator services

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use uniroute_gateway::{CustomRuleStore, ProviderFactory, ProviderKeyStore, RoutingPolicyService, UserPreferenceService};
use uniroute_llm::{CallerId, Provider, RequestContext};
use uniroute_routing::CustomRule;

use super::mock_provider::MockProvider;

/// Fixed routing policy
pub struct StaticPolicy {
    pub locked: bool,
    pub default_strategy: String,
}

#[async_trait]
impl RoutingPolicyService for StaticPolicy {
    async fn is_locked(&self, _context: &RequestContext) -> anyhow::Result<bool> {
        Ok(self.locked)
    }

    async fn default_strategy(&self, _context: &RequestContext) -> anyhow::Result<String> {
        Ok(self.default_strategy.clone())
    }
}

/// Policy service that always errors
pub struct BrokenPolicy;

#[async_trait]
impl RoutingPolicyService for BrokenPolicy {
    async fn is_locked(&self, _context: &RequestContext) -> anyhow::Result<bool> {
        anyhow::bail!("policy store offline")
    }

    async fn default_strategy(&self, _context: &RequestContext) -> anyhow::Result<String> {
        anyhow::bail!("policy store offline")
    }
}

/// Caller preferences keyed by caller
#[derive(Default)]
pub struct StaticPreferences(pub HashMap<CallerId, String>);

#[async_trait]
impl UserPreferenceService for StaticPreferences {
    async fn preference(&self, _context: &RequestContext, caller: CallerId) -> anyhow::Result<Option<String>> {
        Ok(self.0.get(&caller).cloned())
    }
}

/// Custom rules keyed by caller
#[derive(Default)]
pub struct StaticRules(pub HashMap<CallerId, Vec<CustomRule>>);

#[async_trait]
impl CustomRuleStore for StaticRules {
    async fn active_rules(
        &self,
        _context: &RequestContext,
        caller: Option<CallerId>,
    ) -> anyhow::Result<Vec<CustomRule>> {
        Ok(caller.and_then(|c| self.0.get(&c).cloned()).unwrap_or_default())
    }
}

/// Caller keys keyed by (caller, provider)
#[derive(Default)]
pub struct StaticKeys(pub HashMap<(CallerId, String), String>);

impl StaticKeys {
    pub fn with_key(mut self, caller: CallerId, provider: &str, key: &str) -> Self {
        self.0.insert((caller, provider.to_owned()), key.to_owned());
        self
    }
}

#[async_trait]
impl ProviderKeyStore for StaticKeys {
    async fn key(
        &self,
        _context: &RequestContext,
        caller: CallerId,
        provider: &str,
    ) -> anyhow::Result<Option<SecretString>> {
        Ok(self
            .0
            .get(&(caller, provider.to_owned()))
            .map(|k| SecretString::from(k.clone())))
    }
}

/// Builds mock providers for BYOK and remembers what it built
#[derive(Default)]
pub struct MockFactory {
    unhealthy: Vec<String>,
    built: Mutex<Vec<(String, String)>>,
    instances: Mutex<HashMap<String, Arc<MockProvider>>>,
}

impl MockFactory {
    /// Providers with these names are built unhealthy
    pub fn with_unhealthy(names: &[&str]) -> Self {
        Self {
            unhealthy: names.iter().map(|n| (*n).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// (provider, credential) pairs in build order
    pub fn built(&self) -> Vec<(String, String)> {
        self.built.lock().unwrap().clone()
    }

    /// Most recent instance built for `provider`
    pub fn instance(&self, provider: &str) -> Option<Arc<MockProvider>> {
        self.instances.lock().unwrap().get(provider).cloned()
    }
}

impl ProviderFactory for MockFactory {
    fn build(&self, provider: &str, credential: &SecretString) -> Option<Arc<dyn Provider>> {
        let mut mock = MockProvider::new(provider).models(&["test-model", "gpt-4o"]);
        if self.unhealthy.iter().any(|n| n == provider) {
            mock = mock.unavailable();
        }
        let mock = mock.build();

        self.built
            .lock()
            .unwrap()
            .push((provider.to_owned(), credential.expose_secret().to_owned()));
        self.instances
            .lock()
            .unwrap()
            .insert(provider.to_owned(), Arc::clone(&mock));

        Some(mock)
    }
}
