//! Typed JSON-RPC codec with polymorphic fields
//!
//! Protocols such as the language-server protocol declare fields that may hold
//! one of several shapes: a string *or* a markup object *or* a list of either.
//! This crate models such fields as binary Either trees of type descriptors,
//! decides on decode which variant a JSON value is, and keeps that choice so
//! the value encodes back to the same JSON.
//!
//! - **descriptor**: the closed set of type shapes ([`TypeDescriptor`])
//! - **either**: leaf enumeration of nested Eithers, with a shared cache
//! - **matcher**: JSON against descriptors, both directions
//! - **registry**: method name to parameter and result descriptors
//! - **codec**: whole request, notification and response envelopes
//! - **schema**: protocol descriptions loaded from JSON documents
//! - **observability**: `tracing` and OpenTelemetry set-up
//!
//! # Example
//!
//! ```rust
//! use polyrow_core::{MessageCodec, MethodRegistry, ObjectType, TypeDescriptor, Message};
//!
//! let markup = ObjectType::builder("MarkupContent")
//!     .required("kind", TypeDescriptor::string())
//!     .required("value", TypeDescriptor::string())
//!     .build()
//!     .unwrap();
//! let contents = TypeDescriptor::either(TypeDescriptor::array(TypeDescriptor::string()), markup);
//!
//! let registry = MethodRegistry::builder()
//!     .notification("window/showContents", vec![contents])
//!     .build()
//!     .unwrap();
//! let codec = MessageCodec::new(registry);
//!
//! let message = codec
//!     .decode_message(r#"{"jsonrpc":"2.0","method":"window/showContents","params":{"kind":"plaintext","value":"foo"}}"#)
//!     .unwrap();
//!
//! if let Message::Notification(notification) = message {
//!     let params = notification.params.unwrap();
//!     assert!(params.as_either().unwrap().is_right());
//! }
//! ```

pub mod codec;
pub mod descriptor;
pub mod either;
pub mod error;
pub mod matcher;
pub mod observability;
pub mod registry;
pub mod schema;
pub mod types;
pub mod value;

pub use codec::{canonicalize, CodecConfig, MessageCodec, NoCorrelation, ResponseCorrelator};
pub use descriptor::{
    ArrayType, EitherType, MapType, ObjectBuilder, ObjectType, Property, ScalarKind,
    TypeDescriptor,
};
pub use either::{Branch, ChoiceNode, EitherPath, EitherResolver, ResolvedEither, DEFAULT_DEPTH_LIMIT};
pub use error::{DecodeError, Error, ErrorCode, ResponseError, Result};
pub use matcher::Matcher;
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use registry::{MethodRegistration, MethodRegistry, RegistryBuilder};
pub use schema::{MethodSpec, PropertySpec, ProtocolSchema, TypeSpec};
pub use types::{
    EnvelopeHeader, Id, Message, MessageKind, NotificationMessage, RequestMessage,
    ResponseMessage, ResponsePayload, JSONRPC_VERSION,
};
pub use value::{EitherValue, ObjectValue, TypedValue};
