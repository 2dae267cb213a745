//! Telemetry for UniRoute
//!
//! Installs the `tracing` subscriber used by every crate, optionally
//! exporting spans over OTLP.

mod metadata;

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use uniroute_config::TelemetryConfig;
use uniroute_config::telemetry::exporters::{ExportProtocol, ExporterConfig};

/// Keeps the tracer provider alive; flushes and shuts it down on drop
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    pub const fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Export buffered spans now
    ///
    /// # Errors
    ///
    /// Returns an error if the tracer provider fails to flush
    pub fn force_flush(&self) -> anyhow::Result<()> {
        if let Some(ref provider) = self.tracer_provider {
            provider
                .force_flush()
                .map_err(|e| anyhow::anyhow!("failed to flush spans: {e}"))?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Initialize logging and, when an exporter is configured, OTLP span export
///
/// `log_filter` uses `EnvFilter` syntax and falls back to `info` when it
/// does not parse. The returned guard must be held for the lifetime of the
/// application.
///
/// # Errors
///
/// Returns an error if the span exporter cannot be built
pub fn init(config: Option<&TelemetryConfig>, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let Some((telemetry_config, exporter)) = config.and_then(|c| c.span_exporter().map(|e| (c, e))) else {
        tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        return Ok(TelemetryGuard { tracer_provider: None });
    };

    let tracer_provider = init_tracer(telemetry_config, exporter)?;
    let tracer = tracer_provider.tracer("uniroute");
    global::set_tracer_provider(tracer_provider.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .init();

    tracing::debug!(endpoint = %exporter.endpoint, "span export enabled");

    Ok(TelemetryGuard {
        tracer_provider: Some(tracer_provider),
    })
}

fn init_tracer(config: &TelemetryConfig, exporter: &ExporterConfig) -> anyhow::Result<SdkTracerProvider> {
    let provider = SdkTracerProvider::builder()
        .with_resource(metadata::build_resource(config))
        .with_sampler(sampler(config))
        .with_batch_exporter(build_span_exporter(exporter)?)
        .build();

    Ok(provider)
}

/// Sampler for the configured rate, parent-based unless disabled
fn sampler(config: &TelemetryConfig) -> Sampler {
    let sampling_rate = config.tracing.as_ref().map_or(1.0, |t| t.sampling_rate);

    let sampler = if sampling_rate >= 1.0 {
        Sampler::AlwaysOn
    } else if sampling_rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(sampling_rate)
    };

    if config.tracing.as_ref().is_none_or(|t| t.parent_based) {
        Sampler::ParentBased(Box::new(sampler))
    } else {
        sampler
    }
}

/// OTLP span exporter for the configured protocol
fn build_span_exporter(config: &ExporterConfig) -> anyhow::Result<opentelemetry_otlp::SpanExporter> {
    use opentelemetry_otlp::SpanExporter;

    let timeout = Duration::from_secs(config.timeout_secs);

    let exporter = match config.protocol {
        ExportProtocol::Grpc => {
            if !config.headers.is_empty() {
                tracing::warn!("exporter headers are only sent over http_proto");
            }
            SpanExporter::builder()
                .with_tonic()
                .with_endpoint(config.endpoint.as_str())
                .with_timeout(timeout)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build gRPC span exporter: {e}"))?
        }
        ExportProtocol::HttpProto => SpanExporter::builder()
            .with_http()
            .with_endpoint(config.endpoint.as_str())
            .with_timeout(timeout)
            .with_headers(config.headers.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP span exporter: {e}"))?,
    };

    Ok(exporter)
}
