use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use uniroute_config::{RoutingConfig, StrategyType};
use uniroute_llm::{ChatRequest, ChatResponse, LlmError, Provider, RequestContext};
use uniroute_routing::{CostCalculator, CustomRule, LatencyTracker, RoutingStrategy, StrategyFactory};

use crate::byok::ByokResolver;
use crate::error::GatewayError;
use crate::registry::ProviderRegistry;
use crate::services::Services;

/// Dispatches chat requests to providers with strategy selection and failover
///
/// Cheap to clone; clones share providers, signals, and strategy state.
#[derive(Clone)]
pub struct Router {
    pub(crate) inner: Arc<RouterInner>,
}

pub(crate) struct RouterInner {
    registry: RwLock<ProviderRegistry>,
    default_strategy: RwLock<DefaultStrategy>,
    strategies: StrategyFactory,
    services: Services,
    byok: Option<ByokResolver>,
    pub(crate) stream_buffer: usize,
    pub(crate) empty_stream_is_error: bool,
    strict_selection: bool,
}

/// Server default strategy plus the server-wide custom rules
struct DefaultStrategy {
    strategy_type: StrategyType,
    custom: Option<RoutingStrategy>,
}

/// Providers eligible for failover on one request
struct Available {
    providers: Vec<Arc<dyn Provider>>,
    /// Built from the caller's own credentials
    caller_owned: bool,
}

/// Outcome of selection for one request
pub(crate) struct Dispatch {
    /// Candidates in attempt order; the first is the strategy's pick
    pub(crate) candidates: Vec<Arc<dyn Provider>>,
}

impl Router {
    /// Router with no collaborator services
    pub fn new(config: &RoutingConfig) -> Self {
        Self::with_services(config, Services::default())
    }

    /// Router consulting the given collaborator services
    pub fn with_services(config: &RoutingConfig, services: Services) -> Self {
        let costs = Arc::new(CostCalculator::from_config(&config.pricing));
        let latency = Arc::new(LatencyTracker::new(config.latency_samples));
        let strategies = StrategyFactory::new(costs, latency);

        let global_rules: Vec<CustomRule> = config.rules.iter().map(CustomRule::from).collect();
        let custom = (!global_rules.is_empty()).then(|| strategies.custom(&global_rules));

        let byok = match (&services.keys, &services.factory) {
            (Some(keys), Some(factory)) => Some(ByokResolver::new(
                config.byok.providers.clone(),
                Arc::clone(keys),
                Arc::clone(factory),
            )),
            _ => None,
        };

        tracing::debug!(
            strategy = %config.strategy,
            global_rules = global_rules.len(),
            byok = byok.is_some(),
            "router initialized"
        );

        Self {
            inner: Arc::new(RouterInner {
                registry: RwLock::new(ProviderRegistry::new()),
                default_strategy: RwLock::new(DefaultStrategy {
                    strategy_type: config.strategy,
                    custom,
                }),
                strategies,
                services,
                byok,
                stream_buffer: config.stream_buffer.max(1),
                empty_stream_is_error: config.empty_stream_is_error,
                strict_selection: config.strict_selection,
            }),
        }
    }

    /// Register a server provider, replacing any provider with the same name
    pub fn register_provider(&self, provider: Arc<dyn Provider>) {
        tracing::info!(provider = %provider.name(), models = provider.models().len(), "provider registered");

        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(provider);
    }

    /// Registered provider names in registration order
    pub fn list_providers(&self) -> Vec<String> {
        self.registry().names()
    }

    /// Registered provider by name
    pub fn provider(&self, name: &str) -> Result<Arc<dyn Provider>, GatewayError> {
        self.registry().get(name).ok_or_else(|| GatewayError::ProviderNotFound {
            provider: name.to_owned(),
        })
    }

    /// First provider ever registered
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.registry().default_provider()
    }

    /// Change the server default strategy
    ///
    /// Server-wide custom rules survive a type change and are used again
    /// once the type returns to `custom`.
    pub fn set_strategy_type(&self, strategy_type: StrategyType) {
        tracing::info!(strategy = %strategy_type, "default strategy changed");
        self.default_strategy_mut().strategy_type = strategy_type;
    }

    /// Make `custom` the default strategy with the given server-wide rules
    pub fn set_custom_strategy(&self, rules: &[CustomRule]) {
        let strategy = self.inner.strategies.custom(rules);
        tracing::info!(rules = rules.len(), "custom default strategy installed");

        let mut state = self.default_strategy_mut();
        state.strategy_type = StrategyType::Custom;
        state.custom = Some(strategy);
    }

    /// Current server default strategy type
    pub fn strategy_type(&self) -> StrategyType {
        self.default_strategy().strategy_type
    }

    /// Strategy type in effect for the caller: policy lock, then caller preference, then default
    pub async fn strategy_for_caller(&self, context: &RequestContext) -> StrategyType {
        if let Some(policy) = &self.inner.services.policy {
            match policy.is_locked(context).await {
                Ok(true) => return self.strategy_type(),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "failed to read routing policy lock"),
            }
        }

        if let (Some(caller), Some(preferences)) = (context.caller, &self.inner.services.preferences) {
            match preferences.preference(context, caller).await {
                Ok(Some(name)) => match name.parse::<StrategyType>() {
                    Ok(strategy_type) => return strategy_type,
                    Err(_) => tracing::debug!(%caller, preference = %name, "ignoring unknown strategy preference"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(%caller, error = %e, "failed to read strategy preference"),
            }
        }

        self.strategy_type()
    }

    /// Pull the default strategy from the routing policy service and apply it
    ///
    /// Returns the default in effect afterwards.
    pub async fn sync_default_strategy(&self, context: &RequestContext) -> StrategyType {
        let Some(policy) = &self.inner.services.policy else {
            return self.strategy_type();
        };

        match policy.default_strategy(context).await {
            Ok(name) => match name.parse::<StrategyType>() {
                Ok(strategy_type) => self.set_strategy_type(strategy_type),
                Err(_) => tracing::warn!(strategy = %name, "policy names an unknown strategy"),
            },
            Err(e) => tracing::warn!(error = %e, "failed to read default strategy"),
        }

        self.strategy_type()
    }

    /// Whether the caller has stored their own key for `provider`
    pub async fn caller_has_provider_key(&self, context: &RequestContext, provider: &str) -> bool {
        match (context.caller, &self.inner.byok) {
            (Some(caller), Some(byok)) => byok.has_key(context, caller, provider).await,
            _ => false,
        }
    }

    /// Pricing table used for cost-based selection and response costs
    pub fn cost_calculator(&self) -> &Arc<CostCalculator> {
        self.inner.strategies.costs()
    }

    /// Latency history fed by every attempt
    pub fn latency_tracker(&self) -> &Arc<LatencyTracker> {
        self.inner.strategies.latency()
    }

    /// Send `request` to the best provider, failing over through the available set
    pub async fn route(&self, context: &RequestContext, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let dispatch = self.dispatch(context, request).await?;

        let mut attempts = 0;
        let mut last_error = None;

        for provider in &dispatch.candidates {
            if context.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            attempts += 1;
            let start = Instant::now();

            let result = tokio::select! {
                biased;
                () = context.cancellation().cancelled() => return Err(GatewayError::Cancelled),
                result = provider.chat(request, context) => result,
            };

            let latency = start.elapsed();
            self.latency_tracker().record(provider.name(), latency);

            match result {
                Ok(response) => return Ok(self.annotate(response, provider.name(), latency)),
                Err(e) => {
                    tracing::warn!(
                        provider = %provider.name(),
                        model = %request.model,
                        attempt = attempts,
                        error = %e,
                        "provider attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(GatewayError::AllProvidersFailed {
            attempts,
            source: last_error.unwrap_or_else(|| LlmError::Unavailable {
                provider: "none".to_owned(),
            }),
        })
    }

    /// Stamp routing metadata onto a successful response
    fn annotate(&self, mut response: ChatResponse, provider: &str, latency: Duration) -> ChatResponse {
        response.provider = Some(provider.to_owned());
        response.latency_ms = Some(millis(latency));

        if response.usage.total_tokens > 0 {
            response.cost = Some(
                self.cost_calculator()
                    .calculate_actual_cost(provider, &response.model, &response.usage),
            );
        }

        tracing::info!(
            provider = %provider,
            model = %response.model,
            latency_ms = millis(latency),
            cost = response.cost,
            "request routed"
        );

        response
    }

    /// Select a provider and compute the attempt order
    pub(crate) async fn dispatch(
        &self,
        context: &RequestContext,
        request: &ChatRequest,
    ) -> Result<Dispatch, GatewayError> {
        let registered = self.registry().providers();
        if registered.is_empty() {
            return Err(GatewayError::NoProvidersRegistered);
        }

        let strategy = self.resolve_strategy(context).await;
        let selected = strategy.select_provider(request, &registered)?;
        let available = self.available_providers(context).await;

        let candidates = self.attempt_order(selected, available);

        tracing::debug!(
            strategy = %strategy.strategy_type(),
            candidates = ?candidates.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "dispatch planned"
        );

        Ok(Dispatch { candidates })
    }

    /// `[selected, rest of available...]`
    ///
    /// An available provider sharing the selection's name stands in for it,
    /// so a caller's own key is used when they have one. Caller-owned sets
    /// are never mixed with server providers.
    fn attempt_order(&self, selected: Arc<dyn Provider>, available: Available) -> Vec<Arc<dyn Provider>> {
        let Available {
            providers: mut order,
            caller_owned,
        } = available;

        if let Some(index) = order.iter().position(|p| p.name() == selected.name()) {
            let chosen = order.remove(index);
            order.insert(0, chosen);
            return order;
        }

        if caller_owned && !self.inner.strict_selection {
            tracing::debug!(provider = %selected.name(), "selection has no caller-owned counterpart");
            return order;
        }

        if self.inner.strict_selection {
            tracing::debug!(provider = %selected.name(), "selected provider unavailable, no failover");
            return vec![selected];
        }

        tracing::debug!(provider = %selected.name(), "selected provider unavailable, failover follows");
        std::iter::once(selected).chain(order).collect()
    }

    /// Strategy instance for this request's caller
    async fn resolve_strategy(&self, context: &RequestContext) -> RoutingStrategy {
        let strategy_type = self.strategy_for_caller(context).await;

        if strategy_type != StrategyType::Custom {
            return self.inner.strategies.build(strategy_type);
        }

        if let Some(rules) = self.caller_rules(context).await {
            return self.inner.strategies.custom(&rules);
        }

        self.default_strategy()
            .custom
            .clone()
            .unwrap_or_else(|| self.inner.strategies.build(StrategyType::Custom))
    }

    async fn caller_rules(&self, context: &RequestContext) -> Option<Vec<CustomRule>> {
        let caller = context.caller?;
        let store = self.inner.services.rules.as_ref()?;

        match store.active_rules(context, Some(caller)).await {
            Ok(rules) if !rules.is_empty() => Some(rules),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(%caller, error = %e, "failed to load caller custom rules");
                None
            }
        }
    }

    /// Caller's healthy BYOK providers, or every healthy server provider when there are none
    async fn available_providers(&self, context: &RequestContext) -> Available {
        if let (Some(caller), Some(byok)) = (context.caller, &self.inner.byok) {
            let own = byok.resolve(context, caller).await;
            if !own.is_empty() {
                tracing::debug!(%caller, providers = own.len(), "using caller-owned providers");
                return Available {
                    providers: own,
                    caller_owned: true,
                };
            }
        }

        let registered = self.registry().providers();
        let checks = join_all(registered.iter().map(|p| p.health_check(context))).await;

        let providers = registered
            .into_iter()
            .zip(checks)
            .filter_map(|(provider, check)| match check {
                Ok(()) => Some(provider),
                Err(e) => {
                    tracing::debug!(provider = %provider.name(), error = %e, "provider failed health check");
                    None
                }
            })
            .collect();

        Available {
            providers,
            caller_owned: false,
        }
    }

    fn registry(&self) -> std::sync::RwLockReadGuard<'_, ProviderRegistry> {
        self.inner.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn default_strategy(&self) -> std::sync::RwLockReadGuard<'_, DefaultStrategy> {
        self.inner.default_strategy.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn default_strategy_mut(&self) -> std::sync::RwLockWriteGuard<'_, DefaultStrategy> {
        self.inner.default_strategy.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("registry", &*self.registry())
            .field("strategy", &self.strategy_type())
            .field("services", &self.inner.services)
            .finish_non_exhaustive()
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
