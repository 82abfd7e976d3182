//! polyrow - typed JSON-RPC 2.0 messages with polymorphic fields
//!
//! This is the convenience crate that re-exports the polyrow sub-crates.
//!
//! # Architecture
//!
//! - **polyrow-core**: type descriptors, Either resolution, the typed value
//!   model, the envelope codec, schema loading, observability
//! - **polyrow-endpoint**: request correlation, decode failure policy, codec
//!   metrics
//!
//! # Quick Start
//!
//! ```rust
//! use polyrow::{Message, MessageCodec, MethodRegistry, ObjectType, TypeDescriptor};
//!
//! let markup = ObjectType::builder("MarkupContent")
//!     .required("kind", TypeDescriptor::string())
//!     .required("value", TypeDescriptor::string())
//!     .build()
//!     .unwrap();
//! let hover = ObjectType::builder("Hover")
//!     .required("contents", TypeDescriptor::either(TypeDescriptor::string(), markup))
//!     .build()
//!     .unwrap();
//!
//! let registry = MethodRegistry::builder()
//!     .notification("test/hover", vec![hover])
//!     .build()
//!     .unwrap();
//! let codec = MessageCodec::new(registry);
//!
//! let text = r#"{"jsonrpc":"2.0","method":"test/hover","params":{"contents":{"kind":"plaintext","value":"hi"}}}"#;
//! let message = codec.decode_message(text).unwrap();
//! assert!(matches!(message, Message::Notification(_)));
//! assert_eq!(codec.encode_message(&message).unwrap(), text);
//! ```

pub use polyrow_core as core;
pub use polyrow_endpoint as endpoint;

pub use polyrow_core::{
    Branch, CodecConfig, DecodeError, EitherResolver, EitherType, EitherValue, Error, ErrorCode,
    Id, Message, MessageCodec, MessageKind, MethodRegistry, NotificationMessage, ObjectType,
    ObjectValue, ObservabilityConfig, ProtocolSchema, RequestMessage, ResponseError,
    ResponseMessage, Result, TypeDescriptor, TypedValue,
};
pub use polyrow_endpoint::{Dispatch, Endpoint, EndpointBuilder, ErrorObserver, PendingRequests};
