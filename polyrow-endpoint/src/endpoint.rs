//! One side of a protocol conversation
//!
//! An [`Endpoint`] wraps a [`MessageCodec`] with the bookkeeping both peers of
//! a conversation need: outgoing request ids and their methods, so responses
//! decode with the right result type, and the failure policy for inbound
//! messages:
//!
//! - a request that fails to decode is answered with an error response
//! - a notification or response that fails to decode goes to the
//!   [`ErrorObserver`], since there is nobody to answer
//!
//! Endpoints are `Send + Sync`; share one behind an `Arc` across tasks.
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{MethodRegistry, TypeDescriptor};
//! use polyrow_endpoint::{Dispatch, Endpoint};
//!
//! let registry = MethodRegistry::builder()
//!     .request("shutdown", vec![], TypeDescriptor::null())
//!     .build()
//!     .unwrap();
//! let endpoint = Endpoint::new(registry);
//!
//! match endpoint.receive(r#"{"jsonrpc":"2.0","id":1,"method":"nope"}"#) {
//!     Dispatch::Reply(reply) => assert_eq!(reply.error().unwrap().code, -32601),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::metrics::CodecMetrics;
use crate::observer::{ErrorObserver, LogObserver};
use crate::pending::PendingRequests;
use polyrow_core::{
    DecodeError, Id, Message, MessageCodec, MessageKind, MethodRegistry,
    NotificationMessage, RequestMessage, ResponseError, ResponseMessage, Result, TypedValue,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// What to do with an inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Decoded; hand it to the application
    Deliver(Message),
    /// A request failed to decode; send this error response back
    Reply(ResponseMessage),
    /// Failed to decode and went to the error observer
    Reported,
}

pub struct Endpoint {
    codec: MessageCodec,
    pending: PendingRequests,
    observer: Arc<dyn ErrorObserver>,
    metrics: Option<Arc<CodecMetrics>>,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("codec", &self.codec)
            .field("pending", &self.pending.pending_count())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Endpoint {
    /// Endpoint with default settings and a logging observer
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self::from_parts(
            MessageCodec::new(registry),
            Arc::new(LogObserver),
            None,
        )
    }

    pub fn builder() -> crate::EndpointBuilder {
        crate::EndpointBuilder::new()
    }

    pub(crate) fn from_parts(
        codec: MessageCodec,
        observer: Arc<dyn ErrorObserver>,
        metrics: Option<Arc<CodecMetrics>>,
    ) -> Self {
        Self {
            codec,
            pending: PendingRequests::new(),
            observer,
            metrics,
        }
    }

    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// Decode one inbound message and decide what happens to it
    ///
    /// A response, decoded or not, completes its outstanding request.
    pub fn receive(&self, text: &str) -> Dispatch {
        let started = Instant::now();
        let decoded = self.codec.decode_message_with(text, &self.pending);

        match decoded {
            Ok(message) => {
                if let Message::Response(response) = &message {
                    self.complete(response.id.as_ref());
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_decode(message.kind(), started.elapsed().as_secs_f64());
                }
                trace!(kind = %message.kind(), method = ?message.method(), "Delivering message");
                Dispatch::Deliver(message)
            }
            Err(failure) => self.fail(failure),
        }
    }

    fn fail(&self, failure: DecodeError) -> Dispatch {
        if let Some(metrics) = &self.metrics {
            metrics.record_decode_error(&failure.error, failure.kind());
        }
        if failure.kind() == Some(MessageKind::Response) {
            let id = failure.header.as_ref().and_then(|h| h.id.as_ref());
            self.complete(id);
        }

        match failure.reply() {
            Some(reply) => {
                debug!(id = ?reply.id, error = %failure.error, "Answering undecodable request");
                Dispatch::Reply(reply)
            }
            None => {
                self.observer.on_decode_error(&failure);
                Dispatch::Reported
            }
        }
    }

    fn complete(&self, id: Option<&Id>) {
        if let Some(id) = id {
            self.pending.complete(id);
        }
        if let Some(metrics) = &self.metrics {
            metrics.update_pending(self.pending.pending_count());
        }
    }

    /// Encode an outgoing request and track it until its response arrives
    ///
    /// Nothing is tracked when encoding fails, including for a method
    /// registered as a notification.
    pub fn request(
        &self,
        method: impl Into<String>,
        params: Option<TypedValue>,
    ) -> Result<(Id, String)> {
        let method = method.into();
        let id = self.pending.next_id();
        let text = self.encode(&RequestMessage::new(method.clone(), params, id.clone()).into())?;

        self.pending.register(id.clone(), method);
        if let Some(metrics) = &self.metrics {
            metrics.update_pending(self.pending.pending_count());
        }
        Ok((id, text))
    }

    /// Encode an outgoing notification
    pub fn notify(&self, method: impl Into<String>, params: Option<TypedValue>) -> Result<String> {
        self.encode(&NotificationMessage::new(method, params).into())
    }

    /// Answer `request` with `result`, checked against the method's result type
    pub fn respond(&self, request: &RequestMessage, result: impl Into<TypedValue>) -> Result<String> {
        let response = ResponseMessage::success(result, request.id.clone());
        let text = self.codec.encode_response_as(&response, &request.method)?;
        self.record_encode(MessageKind::Response);
        Ok(text)
    }

    /// Answer the request with `id` with an error
    pub fn respond_error(&self, id: impl Into<Option<Id>>, error: ResponseError) -> Result<String> {
        self.encode(&ResponseMessage::failure(error, id).into())
    }

    /// Encode a reply produced by [`receive`](Self::receive)
    pub fn encode_reply(&self, reply: &ResponseMessage) -> Result<String> {
        self.encode(&Message::Response(reply.clone()))
    }

    fn encode(&self, message: &Message) -> Result<String> {
        let text = self.codec.encode_message(message)?;
        self.record_encode(message.kind());
        Ok(text)
    }

    fn record_encode(&self, kind: MessageKind) {
        if let Some(metrics) = &self.metrics {
            metrics.record_encode(kind);
        }
    }
}
