//! Fluent construction of an [`Endpoint`]
//!
//! The builder gathers:
//! - the method registry, given directly or as a schema document
//! - codec settings (Either depth limit, pretty printing)
//! - the observer for unanswerable decode failures
//! - observability, which also turns on codec metrics
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{CodecConfig, ProtocolSchema};
//! use polyrow_endpoint::Endpoint;
//!
//! let schema = ProtocolSchema::from_json_str(r#"{
//!     "methods": [{"name": "exit", "notification": true}]
//! }"#).unwrap();
//!
//! let endpoint = Endpoint::builder()
//!     .schema(schema)
//!     .codec_config(CodecConfig::default().with_pretty(true))
//!     .observer(|failure: &polyrow_core::DecodeError| eprintln!("dropped: {}", failure))
//!     .build()
//!     .unwrap();
//!
//! assert!(endpoint.codec().registry().contains("exit"));
//! ```

use crate::metrics::CodecMetrics;
use crate::observer::{ErrorObserver, LogObserver};
use crate::Endpoint;
use polyrow_core::{
    CodecConfig, Error, MessageCodec, MethodRegistry, ObservabilityConfig, ProtocolSchema, Result,
};
use std::sync::Arc;

#[derive(Default)]
pub struct EndpointBuilder {
    registry: Option<Arc<MethodRegistry>>,
    schema: Option<ProtocolSchema>,
    codec_config: Option<CodecConfig>,
    observer: Option<Arc<dyn ErrorObserver>>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    metrics: bool,
}

impl EndpointBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an already built registry
    pub fn registry(mut self, registry: Arc<MethodRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the registry from a schema document
    ///
    /// Ignored when [`registry`](Self::registry) is also given.
    pub fn schema(mut self, schema: ProtocolSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Codec settings
    ///
    /// The Either depth limit is fixed when a registry is built. With a
    /// [`registry`](Self::registry) given directly, `build` fails unless the
    /// limit here equals the one that registry was built with.
    pub fn codec_config(mut self, config: CodecConfig) -> Self {
        self.codec_config = Some(config);
        self
    }

    pub fn observer(mut self, observer: impl ErrorObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record codec metrics even without initializing observability here
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    pub fn build(self) -> Result<Endpoint> {
        let explicit_config = self.codec_config.is_some();
        let codec_config = self.codec_config.unwrap_or_default();

        let registry = match (self.registry, self.schema) {
            (Some(registry), _) => {
                let built_with = registry.resolver().depth_limit();
                if explicit_config && codec_config.either_depth_limit != built_with {
                    return Err(Error::Internal(format!(
                        "either depth limit {} conflicts with the registry's limit {}",
                        codec_config.either_depth_limit, built_with
                    )));
                }
                registry
            }
            (None, Some(schema)) => schema.into_registry_with(codec_config.clone())?,
            (None, None) => {
                return Err(Error::Internal(
                    "endpoint needs a method registry or a schema".to_string(),
                ))
            }
        };

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }
            polyrow_core::init_observability(config)?;
            Some(Arc::new(CodecMetrics::new()))
        } else if self.metrics {
            Some(Arc::new(CodecMetrics::new()))
        } else {
            None
        };

        tracing::debug!(
            methods = registry.len(),
            frozen = registry.is_frozen(),
            metrics = metrics.is_some(),
            "Endpoint ready"
        );

        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(LogObserver) as Arc<dyn ErrorObserver>);
        let codec = MessageCodec::with_config(registry, &codec_config);

        Ok(Endpoint::from_parts(codec, observer, metrics))
    }
}
