//! Message envelope codec
//!
//! [`MessageCodec`] turns JSON text into typed [`Message`]s and back. The
//! envelope (`jsonrpc`, `id`, `method`) is read by hand; payloads are handed
//! to the [`Matcher`] with the descriptors the [`MethodRegistry`] holds for
//! the method.
//!
//! # Envelope discrimination
//!
//! - `method` and `id` present: request
//! - `method` present, `id` absent: notification
//! - `id` present, `method` absent: response
//!
//! A call whose kind differs from how its method is registered is an
//! invalid envelope, in either direction.
//!
//! A response's `result` is typed by the method of the request it answers.
//! Which request that was is tracked outside the codec and supplied through a
//! [`ResponseCorrelator`]; without one, results stay as raw JSON.
//!
//! # Wire layout
//!
//! Fields are written in the order `jsonrpc, id, method, params` for calls and
//! `jsonrpc, id, result|error` for responses. Notifications have no `id` key.
//! A successful response always writes `result`, as `null` when it carries
//! nothing. Pretty printing is presentation only; [`canonicalize`] gives the
//! minified form used for comparison.
//!
//! # Errors
//!
//! Decode failures come back as [`DecodeError`], which keeps whatever part of
//! the envelope was readable so the caller can still answer a request.
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{MessageCodec, MethodRegistry, ObjectType, TypeDescriptor};
//!
//! let uri = ObjectType::builder("TextDocumentIdentifier")
//!     .required("uri", TypeDescriptor::string())
//!     .build()
//!     .unwrap();
//! let registry = MethodRegistry::builder()
//!     .notification("textDocument/didClose", vec![
//!         ObjectType::builder("DidCloseParams").required("textDocument", uri).build().unwrap(),
//!     ])
//!     .build()
//!     .unwrap();
//! let codec = MessageCodec::new(registry);
//!
//! let text = r#"{"jsonrpc":"2.0","method":"textDocument/didClose","params":{"textDocument":{"uri":"file:///tmp/foo"}}}"#;
//! let message = codec.decode_message(text).unwrap();
//! assert!(message.is_notification());
//! assert_eq!(codec.encode_message(&message).unwrap(), text);
//! ```

use crate::descriptor::TypeDescriptor;
use crate::either::DEFAULT_DEPTH_LIMIT;
use crate::error::{DecodeError, Error, Result};
use crate::matcher::Matcher;
use crate::registry::{MethodRegistration, MethodRegistry};
use crate::types::{
    EnvelopeHeader, Id, Message, MessageKind, NotificationMessage, RequestMessage,
    ResponseMessage, ResponsePayload, JSONRPC_VERSION,
};
use crate::value::{json_kind, TypedValue};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, trace};

/// Codec settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Deepest Either nesting accepted by the resolver
    pub either_depth_limit: usize,
    /// Indent encoded messages
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            either_depth_limit: DEFAULT_DEPTH_LIMIT,
            pretty: false,
        }
    }
}

impl CodecConfig {
    pub fn with_either_depth_limit(mut self, limit: usize) -> Self {
        self.either_depth_limit = limit;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Tells the codec which method a response answers
pub trait ResponseCorrelator {
    /// Method of the outstanding request with this id
    fn method_for(&self, id: &Id) -> Option<String>;
}

impl<F> ResponseCorrelator for F
where
    F: Fn(&Id) -> Option<String>,
{
    fn method_for(&self, id: &Id) -> Option<String> {
        self(id)
    }
}

/// Correlator that knows no requests; results are kept raw
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrelation;

impl ResponseCorrelator for NoCorrelation {
    fn method_for(&self, _id: &Id) -> Option<String> {
        None
    }
}

/// Decodes and encodes whole messages against a method registry
#[derive(Debug, Clone)]
pub struct MessageCodec {
    registry: Arc<MethodRegistry>,
    matcher: Matcher,
    pretty: bool,
}

impl MessageCodec {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self::with_config(registry, &CodecConfig::default())
    }

    /// Codec over `registry`; only the presentation settings of `config` apply
    /// here, the depth limit belongs to the registry
    pub fn with_config(registry: Arc<MethodRegistry>, config: &CodecConfig) -> Self {
        Self {
            matcher: registry.matcher(),
            registry,
            pretty: config.pretty,
        }
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Decode one message, keeping response results raw
    pub fn decode_message(&self, text: &str) -> std::result::Result<Message, DecodeError> {
        self.decode_message_with(text, &NoCorrelation)
    }

    /// Decode one message, typing response results through `correlator`
    pub fn decode_message_with(
        &self,
        text: &str,
        correlator: &dyn ResponseCorrelator,
    ) -> std::result::Result<Message, DecodeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::from(Error::Parse(e.to_string())))?;
        self.decode_value(&value, correlator)
    }

    /// Decode one already parsed message
    pub fn decode_value(
        &self,
        value: &Value,
        correlator: &dyn ResponseCorrelator,
    ) -> std::result::Result<Message, DecodeError> {
        let object = match value {
            Value::Object(object) => object,
            Value::Array(_) => {
                return Err(Error::InvalidEnvelope("batch messages are not supported".into()).into())
            }
            other => {
                return Err(Error::InvalidEnvelope(format!(
                    "expected an object, found {}",
                    json_kind(other)
                ))
                .into())
            }
        };

        let header = read_header(object)?;
        trace!(kind = %header.kind, method = ?header.method, id = ?header.id, "Decoding message");

        let decoded = check_version(object).and_then(|_| match header.kind {
            MessageKind::Request | MessageKind::Notification => self.decode_call(object, &header),
            MessageKind::Response => self.decode_response(object, &header, correlator),
        });

        decoded.map_err(|error| DecodeError::new(error, Some(header)))
    }

    fn decode_call(&self, object: &Map<String, Value>, header: &EnvelopeHeader) -> Result<Message> {
        let method = header
            .method
            .as_deref()
            .ok_or_else(|| Error::Internal("call without method".into()))?;
        let registration = self
            .registry
            .lookup(method)
            .ok_or_else(|| Error::MethodNotFound(method.to_string()))?;
        check_call_kind(&registration, header.kind)?;

        let params = self.decode_params(object.get("params"), registration.params())?;

        match (&header.kind, &header.id) {
            (MessageKind::Request, Some(id)) => {
                Ok(RequestMessage::new(method, params, id.clone()).into())
            }
            _ => Ok(NotificationMessage::new(method, params).into()),
        }
    }

    fn decode_params(
        &self,
        params: Option<&Value>,
        descriptors: &[TypeDescriptor],
    ) -> Result<Option<TypedValue>> {
        match (descriptors, params) {
            ([], None) | ([], Some(Value::Null)) => Ok(None),
            ([], Some(other)) => Err(Error::mismatch("no params", json_kind(other))),
            (_, None) => Err(Error::mismatch(describe_params(descriptors), "absent")),
            ([single], Some(value)) => self.matcher.decode(value, single).map(Some),
            (_, Some(Value::Array(items))) if items.len() == descriptors.len() => items
                .iter()
                .zip(descriptors)
                .enumerate()
                .map(|(i, (item, descriptor))| {
                    self.matcher
                        .decode(item, descriptor)
                        .map_err(|e| e.within(&i.to_string()))
                })
                .collect::<Result<Vec<_>>>()
                .map(|items| Some(TypedValue::Array(items))),
            (_, Some(other)) => Err(Error::mismatch(
                describe_params(descriptors),
                describe_found(other),
            )),
        }
    }

    fn decode_response(
        &self,
        object: &Map<String, Value>,
        header: &EnvelopeHeader,
        correlator: &dyn ResponseCorrelator,
    ) -> Result<Message> {
        let payload = match (object.get("result"), object.get("error")) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidEnvelope(
                    "response carries both result and error".into(),
                ))
            }
            (_, Some(error)) => ResponsePayload::Error(
                serde_json::from_value(error.clone())
                    .map_err(|e| Error::InvalidEnvelope(format!("malformed error object: {}", e)))?,
            ),
            (Some(result), None) => {
                ResponsePayload::Result(self.decode_result(result, header.id.as_ref(), correlator)?)
            }
            (None, None) => ResponsePayload::Result(TypedValue::Null),
        };

        Ok(ResponseMessage {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: header.id.clone(),
            payload,
        }
        .into())
    }

    fn decode_result(
        &self,
        result: &Value,
        id: Option<&Id>,
        correlator: &dyn ResponseCorrelator,
    ) -> Result<TypedValue> {
        let method = id.and_then(|id| correlator.method_for(id));

        let registration = match method {
            Some(method) => Some(
                self.registry
                    .lookup(&method)
                    .ok_or(Error::MethodNotFound(method))?,
            ),
            None => None,
        };

        if result.is_null() {
            return Ok(TypedValue::Null);
        }

        match registration.as_deref().and_then(|r| r.result()) {
            Some(descriptor) => self.matcher.decode(result, descriptor),
            None => Ok(TypedValue::Raw(result.clone())),
        }
    }

    /// Encode a message to text
    ///
    /// Request and notification params are checked against the registered
    /// descriptors; responses are written structurally. Use
    /// [`encode_response_as`](Self::encode_response_as) to check a result.
    pub fn encode_message(&self, message: &Message) -> Result<String> {
        let value = self.encode_message_value(message)?;
        self.render(&value)
    }

    /// Encode a message to its JSON value, fields in wire order
    pub fn encode_message_value(&self, message: &Message) -> Result<Value> {
        let encoded = match message {
            Message::Request(request) => {
                self.encode_call(&request.jsonrpc, Some(&request.id), &request.method, request.params.as_ref())
            }
            Message::Notification(notification) => self.encode_call(
                &notification.jsonrpc,
                None,
                &notification.method,
                notification.params.as_ref(),
            ),
            Message::Response(response) => self.encode_response_value(response, None),
        };

        if let Err(e) = &encoded {
            error!(kind = %message.kind(), method = ?message.method(), error = %e, "Failed to encode message");
        }
        encoded
    }

    /// Encode a response, checking its result against `method`'s result descriptor
    pub fn encode_response_as(&self, response: &ResponseMessage, method: &str) -> Result<String> {
        let registration = self
            .registry
            .lookup(method)
            .ok_or_else(|| Error::MethodNotFound(method.to_string()))?;
        check_call_kind(&registration, MessageKind::Request)?;

        let value = self
            .encode_response_value(response, registration.result())
            .map_err(|e| {
                error!(method, error = %e, "Failed to encode response");
                e
            })?;
        self.render(&value)
    }

    fn encode_call(
        &self,
        jsonrpc: &str,
        id: Option<&Id>,
        method: &str,
        params: Option<&TypedValue>,
    ) -> Result<Value> {
        let registration = self
            .registry
            .lookup(method)
            .ok_or_else(|| Error::MethodNotFound(method.to_string()))?;
        let kind = if id.is_some() {
            MessageKind::Request
        } else {
            MessageKind::Notification
        };
        check_call_kind(&registration, kind)?;
        trace!(method, id = ?id, "Encoding call");

        let mut envelope = Map::new();
        envelope.insert("jsonrpc".into(), Value::String(jsonrpc.to_string()));
        if let Some(id) = id {
            envelope.insert("id".into(), id_to_json(Some(id)));
        }
        envelope.insert("method".into(), Value::String(method.to_string()));
        if let Some(params) = self.encode_params(params, registration.params())? {
            envelope.insert("params".into(), params);
        }
        Ok(Value::Object(envelope))
    }

    fn encode_params(
        &self,
        params: Option<&TypedValue>,
        descriptors: &[TypeDescriptor],
    ) -> Result<Option<Value>> {
        match (descriptors, params) {
            ([], None) | ([], Some(TypedValue::Null)) => Ok(None),
            ([], Some(other)) => Err(Error::mismatch("no params", other.kind_name())),
            (_, None) => Err(Error::mismatch(describe_params(descriptors), "absent")),
            ([single], Some(value)) => self.matcher.encode_as(value, single).map(Some),
            (_, Some(TypedValue::Array(items))) if items.len() == descriptors.len() => items
                .iter()
                .zip(descriptors)
                .enumerate()
                .map(|(i, (item, descriptor))| {
                    self.matcher
                        .encode_as(item, descriptor)
                        .map_err(|e| e.within(&i.to_string()))
                })
                .collect::<Result<Vec<_>>>()
                .map(|items| Some(Value::Array(items))),
            (_, Some(other)) => Err(Error::mismatch(
                describe_params(descriptors),
                other.kind_name(),
            )),
        }
    }

    fn encode_response_value(
        &self,
        response: &ResponseMessage,
        result_type: Option<&TypeDescriptor>,
    ) -> Result<Value> {
        trace!(id = ?response.id, success = response.is_success(), "Encoding response");

        let mut envelope = Map::new();
        envelope.insert("jsonrpc".into(), Value::String(response.jsonrpc.clone()));
        envelope.insert("id".into(), id_to_json(response.id.as_ref()));

        match &response.payload {
            ResponsePayload::Result(result) => {
                let value = match result_type {
                    Some(descriptor) if !result.is_null() => {
                        self.matcher.encode_as(result, descriptor)?
                    }
                    _ => result.to_json(),
                };
                envelope.insert("result".into(), value);
            }
            ResponsePayload::Error(error) => {
                let value = serde_json::to_value(error)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                envelope.insert("error".into(), value);
            }
        }
        Ok(Value::Object(envelope))
    }

    fn render(&self, value: &Value) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        text.map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// A call must use the envelope kind its method is registered with
fn check_call_kind(registration: &MethodRegistration, kind: MessageKind) -> Result<()> {
    if registration.kind() == kind {
        return Ok(());
    }
    Err(Error::InvalidEnvelope(format!(
        "{} is registered as a {}, not a {}",
        registration.name(),
        registration.kind(),
        kind
    )))
}

/// Minified form of a JSON text, field order kept
///
/// Two messages are equal on the wire when their canonical forms are equal.
pub fn canonicalize(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| Error::Serialization(e.to_string()))
}

fn read_header(object: &Map<String, Value>) -> Result<EnvelopeHeader> {
    let method = match object.get("method") {
        None => None,
        Some(Value::String(method)) => Some(method.clone()),
        Some(other) => {
            return Err(Error::InvalidEnvelope(format!(
                "method must be a string, found {}",
                json_kind(other)
            )))
        }
    };

    let (has_id, id) = match object.get("id") {
        None => (false, None),
        Some(Value::Null) => (true, None),
        Some(value) => match Id::from_json(value) {
            Some(id) => (true, Some(id)),
            None => {
                return Err(Error::InvalidEnvelope(format!(
                    "id must be a string or an integer, found {}",
                    value
                )))
            }
        },
    };

    let kind = match (&method, has_id, &id) {
        (Some(_), true, Some(_)) => MessageKind::Request,
        (Some(_), false, _) => MessageKind::Notification,
        (Some(_), true, None) => {
            return Err(Error::InvalidEnvelope("request id must not be null".into()))
        }
        (None, true, _) => MessageKind::Response,
        (None, false, _) => {
            return Err(Error::InvalidEnvelope(
                "message has neither method nor id".into(),
            ))
        }
    };

    let payload = match kind {
        MessageKind::Request | MessageKind::Notification => object.get("params"),
        MessageKind::Response => object.get("error").or_else(|| object.get("result")),
    };

    Ok(EnvelopeHeader {
        kind,
        id,
        method,
        payload: payload.cloned(),
    })
}

fn check_version(object: &Map<String, Value>) -> Result<()> {
    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => Ok(()),
        Some(other) => Err(Error::InvalidEnvelope(format!(
            "unsupported jsonrpc version {}",
            other
        ))),
        None => Err(Error::InvalidEnvelope("missing jsonrpc version".into())),
    }
}

fn id_to_json(id: Option<&Id>) -> Value {
    match id {
        Some(Id::Number(n)) => Value::from(*n),
        Some(Id::String(s)) => Value::String(s.clone()),
        None => Value::Null,
    }
}

fn describe_params(descriptors: &[TypeDescriptor]) -> String {
    match descriptors {
        [single] => single.describe(),
        many => format!("{} positional params", many.len()),
    }
}

fn describe_found(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of {}", items.len()),
        other => json_kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ObjectType;
    use crate::error::ErrorCode;
    use crate::value::ObjectValue;
    use serde_json::json;

    fn position() -> TypeDescriptor {
        ObjectType::builder("Position")
            .required("line", TypeDescriptor::number())
            .required("character", TypeDescriptor::number())
            .build()
            .unwrap()
    }

    fn codec() -> MessageCodec {
        let registry = MethodRegistry::builder()
            .request("test/position", vec![position()], position())
            .request("test/pair", vec![TypeDescriptor::string(), TypeDescriptor::number()], TypeDescriptor::null())
            .request("shutdown", vec![], TypeDescriptor::null())
            .notification("exit", vec![])
            .notification("test/log", vec![TypeDescriptor::string()])
            .request("test/echo", vec![TypeDescriptor::string()], TypeDescriptor::string())
            .build()
            .unwrap();
        MessageCodec::new(registry)
    }

    #[test]
    fn test_notification_without_id() {
        let message = codec()
            .decode_message(r#"{"jsonrpc":"2.0","method":"test/log","params":"hello"}"#)
            .unwrap();

        assert!(message.is_notification());
        assert_eq!(message.method(), Some("test/log"));
    }

    #[test]
    fn test_request_with_string_id() {
        let message = codec()
            .decode_message(r#"{"jsonrpc":"2.0","id":"1","method":"test/echo","params":"hello"}"#)
            .unwrap();

        assert!(message.is_request());
        assert_eq!(message.id(), Some(&Id::String("1".into())));
    }

    #[test]
    fn test_call_kind_must_match_registration() {
        let codec = codec();

        let err = codec
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"method":"exit"}"#)
            .unwrap_err();
        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
        let reply = err.reply().unwrap();
        assert_eq!(reply.id, Some(Id::Number(1)));
        assert_eq!(reply.error().map(|e| e.code), Some(-32600));

        let err = codec
            .decode_message(r#"{"jsonrpc":"2.0","method":"shutdown"}"#)
            .unwrap_err();
        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
        assert_eq!(err.kind(), Some(MessageKind::Notification));
        assert!(err.reply().is_none());
    }

    #[test]
    fn test_response_without_method() {
        let message = codec()
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"result":{"line":1,"character":2}}"#)
            .unwrap();

        assert!(message.is_response());
        match message {
            Message::Response(response) => {
                assert_eq!(
                    response.result(),
                    Some(&TypedValue::Raw(json!({"line": 1, "character": 2})))
                );
            }
            other => panic!("Expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_correlated_response_is_typed() {
        let correlator = |id: &Id| match id {
            Id::Number(1) => Some("test/position".to_string()),
            _ => None,
        };
        let message = codec()
            .decode_message_with(
                r#"{"jsonrpc":"2.0","id":1,"result":{"line":1,"character":2}}"#,
                &correlator,
            )
            .unwrap();

        let response = match message {
            Message::Response(response) => response,
            other => panic!("Expected response, got {:?}", other),
        };
        let result = response.result().unwrap().as_object().unwrap();
        assert_eq!(result.get("line"), Some(&TypedValue::from(1i64)));
    }

    #[test]
    fn test_correlated_unknown_method() {
        let correlator = |_: &Id| Some("test/missing".to_string());
        let err = codec()
            .decode_message_with(r#"{"jsonrpc":"2.0","id":1,"result":null}"#, &correlator)
            .unwrap_err();

        assert_eq!(err.error, Error::MethodNotFound("test/missing".into()));
        assert_eq!(err.kind(), Some(MessageKind::Response));
        assert!(err.reply().is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = codec().decode_message("{not json").unwrap_err();

        assert!(matches!(err.error, Error::Parse(_)));
        assert!(err.header.is_none());
        let reply = err.reply().unwrap();
        assert_eq!(reply.error().map(|e| e.code), Some(ErrorCode::ParseError.code()));
    }

    #[test]
    fn test_batch_rejected() {
        let err = codec()
            .decode_message(r#"[{"jsonrpc":"2.0","method":"exit"}]"#)
            .unwrap_err();

        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
    }

    #[test]
    fn test_unknown_method_keeps_header() {
        let err = codec()
            .decode_message(r#"{"jsonrpc":"2.0","id":7,"method":"foo/bar","params":[1]}"#)
            .unwrap_err();

        assert_eq!(err.error, Error::MethodNotFound("foo/bar".into()));
        let header = err.header.as_ref().unwrap();
        assert_eq!(header.kind, MessageKind::Request);
        assert_eq!(header.id, Some(Id::Number(7)));
        assert_eq!(header.payload, Some(json!([1])));

        let reply = err.reply().unwrap();
        assert_eq!(reply.id, Some(Id::Number(7)));
        assert_eq!(reply.error().map(|e| e.code), Some(-32601));
    }

    #[test]
    fn test_id_outside_i64_rejected_with_null_reply() {
        let err = codec()
            .decode_message(r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"shutdown"}"#)
            .unwrap_err();

        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
        let reply = err.reply().unwrap();
        assert_eq!(reply.id, None);
        assert_eq!(reply.error().map(|e| e.code), Some(-32600));
    }

    #[test]
    fn test_error_response_null_data_survives() {
        let codec = codec();
        let text = r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32603,"message":"boom","data":null}}"#;

        let message = codec.decode_message(text).unwrap();
        assert_eq!(codec.encode_message(&message).unwrap(), text);
    }

    #[test]
    fn test_both_result_and_error_invalid() {
        let err = codec()
            .decode_message(
                r#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#,
            )
            .unwrap_err();

        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
        assert_eq!(err.error.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let err = codec()
            .decode_message(r#"{"jsonrpc":"1.0","id":1,"method":"shutdown"}"#)
            .unwrap_err();

        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
        assert_eq!(err.reply().unwrap().id, Some(Id::Number(1)));
    }

    #[test]
    fn test_null_id_on_request_rejected() {
        let err = codec()
            .decode_message(r#"{"jsonrpc":"2.0","id":null,"method":"shutdown"}"#)
            .unwrap_err();

        assert!(matches!(err.error, Error::InvalidEnvelope(_)));
    }

    #[test]
    fn test_null_id_response_round_trips() {
        let codec = codec();
        let text = r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#;

        let message = codec.decode_message(text).unwrap();
        assert_eq!(message.id(), None);
        assert_eq!(codec.encode_message(&message).unwrap(), text);
    }

    #[test]
    fn test_params_type_mismatch() {
        let err = codec()
            .decode_message(
                r#"{"jsonrpc":"2.0","id":2,"method":"test/position","params":{"line":"4","character":1}}"#,
            )
            .unwrap_err();

        assert_eq!(err.error.code(), ErrorCode::InvalidParams);
        assert_eq!(err.error.path(), Some("/line"));
    }

    #[test]
    fn test_param_arity() {
        let codec = codec();

        let pair = codec
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"method":"test/pair","params":["a",1]}"#)
            .unwrap();
        match pair {
            Message::Request(request) => {
                assert_eq!(request.params.unwrap().as_array().unwrap().len(), 2)
            }
            other => panic!("Expected request, got {:?}", other),
        }

        let short = codec
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"method":"test/pair","params":["a"]}"#)
            .unwrap_err();
        assert!(short.error.is_mismatch());

        let missing = codec
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"method":"test/position"}"#)
            .unwrap_err();
        assert!(missing.error.is_mismatch());

        let none = codec
            .decode_message(r#"{"jsonrpc":"2.0","id":1,"method":"shutdown","params":null}"#)
            .unwrap();
        assert!(none.is_request());

        let unexpected = codec
            .decode_message(r#"{"jsonrpc":"2.0","method":"exit","params":{}}"#)
            .unwrap_err();
        assert!(unexpected.error.is_mismatch());
    }

    #[test]
    fn test_encode_field_order() {
        let codec = codec();
        let request = RequestMessage::new(
            "test/position",
            Some(ObjectValue::new().with("character", 22i64).with("line", 4i64).into()),
            Id::from("1"),
        );

        let text = codec.encode_message(&request.into()).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","id":"1","method":"test/position","params":{"line":4,"character":22}}"#
        );
    }

    #[test]
    fn test_notification_has_no_id_key() {
        let text = codec()
            .encode_message(&NotificationMessage::new("exit", None).into())
            .unwrap();

        assert_eq!(text, r#"{"jsonrpc":"2.0","method":"exit"}"#);
    }

    #[test]
    fn test_empty_result_written_as_null() {
        let text = codec()
            .encode_message(&ResponseMessage::empty(Id::Number(3)).into())
            .unwrap();

        assert_eq!(text, r#"{"jsonrpc":"2.0","id":3,"result":null}"#);
    }

    #[test]
    fn test_response_without_result_or_error_decodes_null() {
        let message = codec().decode_message(r#"{"jsonrpc":"2.0","id":3}"#).unwrap();

        match message {
            Message::Response(response) => assert_eq!(response.result(), Some(&TypedValue::Null)),
            other => panic!("Expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_unregistered_method_fails() {
        let err = codec()
            .encode_message(&NotificationMessage::new("foo/bar", None).into())
            .unwrap_err();

        assert_eq!(err, Error::MethodNotFound("foo/bar".into()));
    }

    #[test]
    fn test_encode_rejects_call_of_wrong_kind() {
        let codec = codec();

        let err = codec
            .encode_message(&RequestMessage::new("exit", None, Id::Number(1)).into())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnvelope(_)));

        let err = codec
            .encode_message(&NotificationMessage::new("shutdown", None).into())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnvelope(_)));

        let err = codec
            .encode_response_as(&ResponseMessage::empty(Id::Number(2)), "exit")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnvelope(_)));
    }

    #[test]
    fn test_encode_response_as_checks_result() {
        let codec = codec();
        let bad = ResponseMessage::success(ObjectValue::new().with("line", 1i64), Id::Number(1));

        let err = codec.encode_response_as(&bad, "test/position").unwrap_err();
        assert!(err.is_mismatch());

        let good = ResponseMessage::success(
            ObjectValue::new().with("line", 1i64).with("character", 0i64),
            Id::Number(1),
        );
        assert_eq!(
            codec.encode_response_as(&good, "test/position").unwrap(),
            r#"{"jsonrpc":"2.0","id":1,"result":{"line":1,"character":0}}"#
        );
    }

    #[test]
    fn test_pretty_output() {
        let registry = MethodRegistry::builder()
            .request("shutdown", vec![], TypeDescriptor::null())
            .build()
            .unwrap();
        let codec = MessageCodec::with_config(registry, &CodecConfig::default().with_pretty(true));

        let text = codec
            .encode_message(&RequestMessage::new("shutdown", None, Id::Number(1)).into())
            .unwrap();
        assert_eq!(
            text,
            "{\n  \"jsonrpc\": \"2.0\",\n  \"id\": 1,\n  \"method\": \"shutdown\"\n}"
        );
        assert_eq!(
            canonicalize(&text).unwrap(),
            r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#
        );
    }
}
