//! Message dispatch on top of the polyrow codec
//!
//! `polyrow-core` decodes and encodes single messages. This crate adds what a
//! peer in a conversation needs around that:
//!
//! - **Endpoint**: decode inbound text and decide whether to deliver it,
//!   answer it with an error, or report it
//! - **Pending requests**: ids of outgoing requests and their methods, so a
//!   response's `result` is decoded with the right descriptor
//! - **Error observers**: where failures without a reply channel go
//! - **Metrics**: OpenTelemetry counters and histograms for the codec
//!
//! Transport and framing stay with the caller: an endpoint consumes and
//! produces JSON text.
//!
//! # Quick Start
//!
//! ```rust
//! use polyrow_core::{Message, MethodRegistry, ObjectType, ObjectValue, TypeDescriptor};
//! use polyrow_endpoint::{Dispatch, Endpoint};
//!
//! let position = ObjectType::builder("Position")
//!     .required("line", TypeDescriptor::number())
//!     .required("character", TypeDescriptor::number())
//!     .build()
//!     .unwrap();
//! let registry = MethodRegistry::builder()
//!     .request("test/echo", vec![position.clone()], position)
//!     .build()
//!     .unwrap();
//!
//! let client = Endpoint::new(registry.clone());
//! let server = Endpoint::new(registry);
//!
//! let params = ObjectValue::new().with("line", 4i64).with("character", 22i64);
//! let (_id, text) = client.request("test/echo", Some(params.into())).unwrap();
//!
//! let reply = match server.receive(&text) {
//!     Dispatch::Deliver(Message::Request(request)) => {
//!         let echoed = request.params.clone().unwrap();
//!         server.respond(&request, echoed).unwrap()
//!     }
//!     other => panic!("unexpected {:?}", other),
//! };
//!
//! assert!(matches!(client.receive(&reply), Dispatch::Deliver(Message::Response(_))));
//! assert_eq!(client.pending().pending_count(), 0);
//! ```

pub mod builder;
pub mod endpoint;
pub mod metrics;
pub mod observer;
pub mod pending;

pub use builder::EndpointBuilder;
pub use endpoint::{Dispatch, Endpoint};
pub use metrics::CodecMetrics;
pub use observer::{ErrorObserver, LogObserver};
pub use pending::PendingRequests;
