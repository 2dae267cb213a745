use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use uniroute_llm::Provider;

/// Server-configured providers in registration order
///
/// Re-registering a name replaces the provider in place. The default slot
/// holds the first provider ever registered.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn Provider>>,
    default: Option<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a provider under its name
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        if self.default.is_none() {
            self.default = Some(Arc::clone(&provider));
        }

        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Provider registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// First provider ever registered
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.default.clone()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Registered providers in registration order
    pub fn providers(&self) -> Vec<Arc<dyn Provider>> {
        self.providers.values().cloned().collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("default", &self.default.as_ref().map(|p| p.name()))
            .finish()
    }
}
