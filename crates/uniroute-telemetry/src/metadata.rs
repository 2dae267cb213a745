use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use uniroute_config::TelemetryConfig;

/// Resource describing this UniRoute instance
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let mut attrs = vec![
        KeyValue::new(semconv::SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION").to_string()),
    ];

    let mut extra: Vec<_> = config.resource_attributes.iter().collect();
    extra.sort_by_key(|(key, _)| key.as_str());
    attrs.extend(extra.into_iter().map(|(key, value)| KeyValue::new(key.clone(), value.clone())));

    Resource::builder().with_attributes(attrs).build()
}
