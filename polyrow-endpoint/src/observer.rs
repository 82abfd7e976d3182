//! Sinks for decode failures that cannot be answered
//!
//! Notifications and responses have no reply channel, so when one fails to
//! decode the failure goes to an [`ErrorObserver`] instead of back to the
//! peer. Closures work as observers.

use polyrow_core::DecodeError;
use tracing::warn;

/// Receives decode failures of messages that get no reply
pub trait ErrorObserver: Send + Sync {
    fn on_decode_error(&self, failure: &DecodeError);
}

impl<F> ErrorObserver for F
where
    F: Fn(&DecodeError) + Send + Sync,
{
    fn on_decode_error(&self, failure: &DecodeError) {
        self(failure)
    }
}

/// Default observer: one `warn!` event per failure
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ErrorObserver for LogObserver {
    fn on_decode_error(&self, failure: &DecodeError) {
        let header = failure.header.as_ref();
        warn!(
            kind = ?header.map(|h| h.kind),
            method = ?header.and_then(|h| h.method.as_deref()),
            id = ?header.and_then(|h| h.id.as_ref()),
            error = %failure.error,
            "Dropped message that failed to decode"
        );
    }
}
