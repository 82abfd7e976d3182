//! Codec metrics
//!
//! OpenTelemetry instruments recorded by an [`Endpoint`](crate::Endpoint)
//! when metrics are enabled:
//!
//! - **polyrow.codec.messages.decoded**: messages decoded, by kind (counter)
//! - **polyrow.codec.messages.encoded**: messages encoded, by kind (counter)
//! - **polyrow.codec.decode.errors**: failed decodes, by error kind (counter)
//! - **polyrow.codec.decode.duration**: decode latency in seconds (histogram)
//! - **polyrow.codec.pending.requests**: outgoing requests awaiting a response (gauge)
//!
//! Instruments are created from the global meter provider, so they export
//! wherever [`init_observability`](polyrow_core::init_observability) sends
//! them, and are no-ops when no provider is installed.

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};
use polyrow_core::{Error, MessageKind};

const METER_NAME: &str = "polyrow";

pub struct CodecMetrics {
    pub messages_decoded: Counter<u64>,
    pub messages_encoded: Counter<u64>,
    pub decode_errors: Counter<u64>,
    pub decode_duration: Histogram<f64>,
    pub pending_requests: Gauge<i64>,
}

impl std::fmt::Debug for CodecMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecMetrics").finish_non_exhaustive()
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecMetrics {
    /// Instruments on the global meter provider
    pub fn new() -> Self {
        Self::new_with_meter(&global::meter(METER_NAME))
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            messages_decoded: meter
                .u64_counter("polyrow.codec.messages.decoded")
                .with_description("Number of messages decoded")
                .build(),
            messages_encoded: meter
                .u64_counter("polyrow.codec.messages.encoded")
                .with_description("Number of messages encoded")
                .build(),
            decode_errors: meter
                .u64_counter("polyrow.codec.decode.errors")
                .with_description("Number of messages that failed to decode")
                .build(),
            decode_duration: meter
                .f64_histogram("polyrow.codec.decode.duration")
                .with_description("Message decode duration in seconds")
                .build(),
            pending_requests: meter
                .i64_gauge("polyrow.codec.pending.requests")
                .with_description("Outgoing requests awaiting a response")
                .build(),
        }
    }

    pub fn record_decode(&self, kind: MessageKind, duration_secs: f64) {
        let attributes = &[KeyValue::new("kind", kind.to_string())];
        self.messages_decoded.add(1, attributes);
        self.decode_duration.record(duration_secs, attributes);
    }

    pub fn record_decode_error(&self, error: &Error, kind: Option<MessageKind>) {
        let attributes = &[
            KeyValue::new("error_type", error_label(error)),
            KeyValue::new(
                "kind",
                kind.map(|k| k.to_string()).unwrap_or_else(|| "unknown".to_string()),
            ),
        ];
        self.decode_errors.add(1, attributes);
    }

    pub fn record_encode(&self, kind: MessageKind) {
        self.messages_encoded
            .add(1, &[KeyValue::new("kind", kind.to_string())]);
    }

    pub fn update_pending(&self, count: usize) {
        self.pending_requests
            .record(i64::try_from(count).unwrap_or(i64::MAX), &[]);
    }
}

/// Low-cardinality label for an error kind
pub fn error_label(error: &Error) -> &'static str {
    match error {
        Error::Parse(_) => "parse",
        Error::InvalidEnvelope(_) => "invalid_envelope",
        Error::MethodNotFound(_) => "method_not_found",
        Error::TypeMismatch { .. } => "type_mismatch",
        Error::NoVariantMatched { .. } => "no_variant_matched",
        Error::UnboundedEitherDepth { .. } => "unbounded_either_depth",
        Error::RegistryFrozen(_) => "registry_frozen",
        Error::InvalidTypeDescriptor(_) => "invalid_type_descriptor",
        Error::DuplicateMethod(_) => "duplicate_method",
        Error::Serialization(_) => "serialization",
        Error::Internal(_) => "internal",
    }
}
