//! Message envelopes as seen by the codec
//!
//! The protocol has three envelope kinds:
//!
//! 1. **Request**: a call that expects a response, correlated by `id`
//! 2. **Notification**: a call without `id`, never answered
//! 3. **Response**: the outcome of a request, carrying either `result` or `error`
//!
//! Payloads (`params`, `result`) are held as [`TypedValue`]s, already matched
//! against the descriptors registered for the method. The wire layout
//! (field order, null rules) is produced by [`crate::codec::MessageCodec`],
//! not by these types.
//!
//! # Request IDs
//!
//! An `id` is a JSON string or an integer and round-trips exactly: the string
//! `"1"` never becomes the number `1`. Notifications have no id at all.

use crate::error::ResponseError;
use crate::value::TypedValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Protocol version carried in every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier
///
/// Serialized untagged, as the bare string or number.
///
/// # Examples
///
/// ```rust
/// use polyrow_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    String(String),
}

impl Id {
    /// Read an id from its JSON form
    ///
    /// Only strings and integers qualify; `null`, fractions and
    /// structured values yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Number(n) => n.as_i64().map(Id::Number),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u32> for Id {
    fn from(n: u32) -> Self {
        Id::Number(i64::from(n))
    }
}

/// The three envelope kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Request,
    Notification,
    Response,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Request => "request",
            MessageKind::Notification => "notification",
            MessageKind::Response => "response",
        };
        f.write_str(name)
    }
}

/// A call that expects a response
///
/// # Examples
///
/// ```rust
/// use polyrow_core::{Id, ObjectValue, RequestMessage};
///
/// let params = ObjectValue::new().with("uri", "file:///tmp/foo");
/// let request = RequestMessage::new("textDocument/hover", Some(params.into()), Id::from("1"));
/// assert_eq!(request.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMessage {
    pub jsonrpc: String,
    pub id: Id,
    pub method: String,
    /// Absent when the method takes no parameters
    pub params: Option<TypedValue>,
}

impl RequestMessage {
    pub fn new(method: impl Into<String>, params: Option<TypedValue>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A call without a reply channel
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<TypedValue>,
}

impl NotificationMessage {
    pub fn new(method: impl Into<String>, params: Option<TypedValue>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Outcome carried by a response; `result` and `error` exclude each other
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Result(TypedValue),
    Error(ResponseError),
}

/// The answer to a request
///
/// `id` is `None` only when the request's id could not be determined (for
/// example a parse failure); it is then written as `"id": null`.
///
/// # Examples
///
/// ```rust
/// use polyrow_core::{Id, ResponseError, ResponseMessage};
///
/// let success = ResponseMessage::success("ok", Id::Number(1));
/// assert!(success.is_success());
///
/// let failure = ResponseMessage::failure(ResponseError::invalid_params("bad"), Id::Number(2));
/// assert!(failure.is_error());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMessage {
    pub jsonrpc: String,
    pub id: Option<Id>,
    pub payload: ResponsePayload,
}

impl ResponseMessage {
    /// Successful response carrying `result`
    pub fn success(result: impl Into<TypedValue>, id: impl Into<Option<Id>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            payload: ResponsePayload::Result(result.into()),
        }
    }

    /// Successful response with no meaningful result, written as `"result": null`
    pub fn empty(id: impl Into<Option<Id>>) -> Self {
        Self::success(TypedValue::Null, id)
    }

    /// Failed response
    pub fn failure(error: ResponseError, id: impl Into<Option<Id>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            payload: ResponsePayload::Error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.payload, ResponsePayload::Result(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    pub fn result(&self) -> Option<&TypedValue> {
        match &self.payload {
            ResponsePayload::Result(result) => Some(result),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ResponseError> {
        match &self.payload {
            ResponsePayload::Error(error) => Some(error),
            ResponsePayload::Result(_) => None,
        }
    }
}

/// Any decoded envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(RequestMessage),
    Notification(NotificationMessage),
    Response(ResponseMessage),
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Notification(_))
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_))
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Request(_) => MessageKind::Request,
            Message::Notification(_) => MessageKind::Notification,
            Message::Response(_) => MessageKind::Response,
        }
    }

    /// Method name, for requests and notifications
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(request) => Some(&request.method),
            Message::Notification(notification) => Some(&notification.method),
            Message::Response(_) => None,
        }
    }

    /// Correlation id, for requests and responses
    pub fn id(&self) -> Option<&Id> {
        match self {
            Message::Request(request) => Some(&request.id),
            Message::Response(response) => response.id.as_ref(),
            Message::Notification(_) => None,
        }
    }
}

impl From<RequestMessage> for Message {
    fn from(request: RequestMessage) -> Self {
        Message::Request(request)
    }
}

impl From<NotificationMessage> for Message {
    fn from(notification: NotificationMessage) -> Self {
        Message::Notification(notification)
    }
}

impl From<ResponseMessage> for Message {
    fn from(response: ResponseMessage) -> Self {
        Message::Response(response)
    }
}

/// Envelope fields that could be read from a message, payload still raw
///
/// Attached to decode failures so the caller can answer or report them.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeHeader {
    pub kind: MessageKind,
    pub id: Option<Id>,
    pub method: Option<String>,
    /// `params` for calls, `result` or `error` for responses
    pub payload: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
    }

    #[test]
    fn test_id_string_and_number_stay_distinct() {
        let string: Id = serde_json::from_value(json!("1")).unwrap();
        let number: Id = serde_json::from_value(json!(1)).unwrap();

        assert_eq!(string, Id::String("1".into()));
        assert_eq!(number, Id::Number(1));
        assert_eq!(serde_json::to_value(&string).unwrap(), json!("1"));
        assert_eq!(serde_json::to_value(&number).unwrap(), json!(1));
    }

    #[test]
    fn test_id_from_json_rejects_non_ids() {
        assert_eq!(Id::from_json(&json!(null)), None);
        assert_eq!(Id::from_json(&json!(1.5)), None);
        assert_eq!(Id::from_json(&json!({"id": 1})), None);
        assert_eq!(Id::from_json(&json!(12)), Some(Id::Number(12)));
    }

    #[test]
    fn test_response_accessors() {
        let success = ResponseMessage::success(TypedValue::from(3i64), Id::Number(1));
        assert!(success.is_success());
        assert_eq!(success.result(), Some(&TypedValue::from(3i64)));
        assert!(success.error().is_none());

        let failure =
            ResponseMessage::failure(ResponseError::internal_error("boom"), Id::Number(1));
        assert!(failure.is_error());
        assert!(failure.result().is_none());
    }

    #[test]
    fn test_empty_response_has_null_result() {
        let response = ResponseMessage::empty(Id::String("5".into()));
        assert_eq!(response.result(), Some(&TypedValue::Null));
    }

    #[test]
    fn test_message_accessors() {
        let request: Message = RequestMessage::new("shutdown", None, Id::Number(9)).into();
        assert_eq!(request.kind(), MessageKind::Request);
        assert_eq!(request.method(), Some("shutdown"));
        assert_eq!(request.id(), Some(&Id::Number(9)));

        let notification: Message = NotificationMessage::new("exit", None).into();
        assert!(notification.is_notification());
        assert_eq!(notification.id(), None);
    }
}
