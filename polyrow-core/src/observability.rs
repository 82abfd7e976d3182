//! OpenTelemetry wiring for processes embedding the codec
//!
//! The codec itself only emits `tracing` events: `debug!` while the registry
//! is built and Either trees are resolved, `trace!` per message, `warn!` and
//! `error!` for failures. This module installs a subscriber that turns those
//! into JSON log lines and, optionally, OTLP spans and metrics.
//!
//! ```rust,no_run
//! use polyrow_core::ObservabilityConfig;
//!
//! let config = ObservabilityConfig::new("lsp-bridge")
//!     .with_endpoint("http://localhost:4317")
//!     .with_log_level("polyrow_core=debug");
//!
//! polyrow_core::init_observability(config).expect("observability");
//! // ... decode and encode messages ...
//! polyrow_core::shutdown_observability();
//! ```
//!
//! `OTEL_EXPORTER_OTLP_ENDPOINT` and `RUST_LOG` provide the defaults.

use crate::error::{Error, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use parking_lot::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often aggregated metrics are pushed to the collector
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Providers installed by [`init_observability`], flushed on shutdown
#[derive(Default)]
struct Installed {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

static INSTALLED: Mutex<Installed> = Mutex::new(Installed {
    tracer_provider: None,
    meter_provider: None,
});

/// Telemetry settings
///
/// Each pillar can be switched off on its own. With logs off and traces off
/// no subscriber is installed, which leaves an embedding application free to
/// install its own.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// `service.name` resource attribute
    pub service_name: String,
    /// `service.version` resource attribute
    pub service_version: String,
    /// OTLP/gRPC collector endpoint
    pub otlp_endpoint: String,
    pub enable_traces: bool,
    pub enable_metrics: bool,
    /// Local JSON log output
    pub enable_logs: bool,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "polyrow".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the telemetry pipeline described by `config`
///
/// Call once at start-up. A second call fails with `Error::Internal` because
/// the global subscriber is already set.
///
/// # Errors
///
/// Exporter construction failures, invalid log directives, or an already
/// installed global subscriber.
pub fn init_observability(config: ObservabilityConfig) -> Result<()> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    if tracer.is_some() || config.enable_logs {
        init_subscriber(&config, tracer)?;
    }

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "Observability initialized"
    );

    Ok(())
}

fn telemetry_error(stage: &str, error: impl std::fmt::Display) -> Error {
    Error::Internal(format!("{} setup failed: {}", stage, error))
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| telemetry_error("span exporter", e))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global.
    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());
    INSTALLED.lock().tracer_provider = Some(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()
        .map_err(|e| telemetry_error("metric exporter", e))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRICS_EXPORT_INTERVAL)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    INSTALLED.lock().meter_provider = Some(provider);
    Ok(())
}

fn init_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| telemetry_error("log filter", e))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| telemetry_error("subscriber", e))
}

/// Flush pending spans and metrics and stop the exporters
///
/// Safe to call when nothing was installed, and more than once; later calls
/// find nothing left to shut down. Exporter failures are logged, not returned,
/// since shutdown runs on the way out of the process.
pub fn shutdown_observability() {
    let Installed {
        tracer_provider,
        meter_provider,
    } = std::mem::take(&mut *INSTALLED.lock());

    if tracer_provider.is_none() && meter_provider.is_none() {
        return;
    }
    tracing::info!("Shutting down observability");

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }
    if let Some(provider) = meter_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "polyrow");
        assert!(config.enable_traces);
        assert!(config.enable_metrics);
        assert!(config.enable_logs);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ObservabilityConfig::new("lsp-bridge")
            .with_endpoint("http://collector:4317")
            .with_log_level("polyrow_core=trace")
            .with_version("2.0.0")
            .with_traces(false)
            .with_metrics(false);

        assert_eq!(config.service_name, "lsp-bridge");
        assert_eq!(config.otlp_endpoint, "http://collector:4317");
        assert_eq!(config.log_level, "polyrow_core=trace");
        assert_eq!(config.service_version, "2.0.0");
        assert!(!config.enable_traces);
        assert!(!config.enable_metrics);
        assert!(config.enable_logs);
    }

    #[test]
    fn test_resource_carries_service_identity() {
        let resource = ObservabilityConfig::new("lsp-bridge")
            .with_version("1.2.3")
            .resource();

        let name = resource.get(&opentelemetry::Key::from_static_str(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        ));
        assert_eq!(name.map(|v| v.to_string()), Some("lsp-bridge".to_string()));
    }

    #[test]
    fn test_init_all_disabled_installs_nothing() {
        let config = ObservabilityConfig::new("quiet")
            .with_traces(false)
            .with_metrics(false)
            .with_logs(false);

        assert!(init_observability(config).is_ok());
    }

    #[test]
    fn test_shutdown_without_init_is_noop() {
        shutdown_observability();
        shutdown_observability();
        assert!(INSTALLED.lock().tracer_provider.is_none());
        assert!(INSTALLED.lock().meter_provider.is_none());
    }
}
