//! Bring-your-own-key provider resolution

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use uniroute_llm::{CallerId, Provider, RequestContext};

use crate::services::{ProviderFactory, ProviderKeyStore};

/// Build a caller's own providers from their stored credentials
pub struct ByokResolver {
    providers: Vec<String>,
    keys: Arc<dyn ProviderKeyStore>,
    factory: Arc<dyn ProviderFactory>,
}

impl ByokResolver {
    /// Resolver probing `providers` in order
    pub fn new(providers: Vec<String>, keys: Arc<dyn ProviderKeyStore>, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            providers,
            keys,
            factory,
        }
    }

    /// Caller's providers that were built and pass a health check, in configured order
    pub async fn resolve(&self, context: &RequestContext, caller: CallerId) -> Vec<Arc<dyn Provider>> {
        let mut built = Vec::new();

        for name in &self.providers {
            let Some(credential) = self.credential(context, caller, name).await else {
                continue;
            };

            match self.factory.build(name, &credential) {
                Some(provider) => built.push(provider),
                None => tracing::debug!(provider = %name, "no BYOK constructor for provider"),
            }
        }

        let checks = join_all(built.iter().map(|p| p.health_check(context))).await;

        built
            .into_iter()
            .zip(checks)
            .filter_map(|(provider, check)| match check {
                Ok(()) => Some(provider),
                Err(e) => {
                    tracing::warn!(provider = %provider.name(), error = %e, "BYOK provider failed health check");
                    None
                }
            })
            .collect()
    }

    /// Whether the caller stored a usable credential for `provider`
    pub async fn has_key(&self, context: &RequestContext, caller: CallerId, provider: &str) -> bool {
        self.credential(context, caller, provider).await.is_some()
    }

    async fn credential(&self, context: &RequestContext, caller: CallerId, provider: &str) -> Option<SecretString> {
        match self.keys.key(context, caller, provider).await {
            Ok(Some(key)) if !key.expose_secret().trim().is_empty() => Some(key),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "failed to load caller provider key");
                None
            }
        }
    }
}

impl fmt::Debug for ByokResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByokResolver").field("providers", &self.providers).finish()
    }
}
