//! Error types for polyrow
//!
//! Two layers of errors live here:
//!
//! - **Error**: what the codec, matcher and registry report internally (uses thiserror)
//! - **ResponseError**: the wire-format error object carried by a failed response
//!
//! Every `Error` maps onto a JSON-RPC error code through
//! [`Error::to_response_error`], so a failure to decode a request can always be
//! answered on the wire.
//!
//! # Error Codes
//!
//! The five JSON-RPC 2.0 codes are preserved bit-for-bit:
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid request (inconsistent envelope)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params (payload does not match its descriptor)
//! - `-32603`: Internal error
//!
//! The language-server protocol reserves a few more (`ServerNotInitialized`,
//! `UnknownErrorCode`, `RequestCancelled`, `ContentModified`); see [`ErrorCode`].
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{Error, ResponseError};
//!
//! let error = Error::MethodNotFound("textDocument/unknown".into());
//! let wire = error.to_response_error();
//! assert_eq!(wire.code, -32601);
//! ```

use crate::types::{EnvelopeHeader, Id, MessageKind, ResponseMessage};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Result type for polyrow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds raised while describing, matching and (de)serializing messages
///
/// # Error Categories
///
/// - **Input errors**: Parse, InvalidEnvelope, MethodNotFound, TypeMismatch,
///   NoVariantMatched. These come from bad peers and never abort the process.
/// - **Programmer errors**: UnboundedEitherDepth, RegistryFrozen,
///   InvalidTypeDescriptor, DuplicateMethod. These abort registration.
/// - **Processing errors**: Serialization, Internal
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The message text is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The JSON is valid but the envelope is structurally inconsistent
    /// (for example a response carrying both `result` and `error`)
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// No registration exists for the named method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A JSON value does not have the shape its descriptor demands
    ///
    /// `path` is a JSON pointer to the offending value, relative to the
    /// value handed to the matcher.
    #[error("Type mismatch at {}: expected {expected}, found {found}", display_path(.path))]
    TypeMismatch {
        /// JSON pointer to the offending value
        path: String,
        /// Description of the expected descriptor
        expected: String,
        /// JSON kind that was found instead
        found: String,
    },

    /// None of the leaves of an Either descriptor accepted the value
    #[error("No variant of {expected} matched {found} at {}", display_path(.path))]
    NoVariantMatched {
        /// JSON pointer to the offending value
        path: String,
        /// Description of the Either descriptor
        expected: String,
        /// JSON kind that was found
        found: String,
    },

    /// An Either tree nests deeper than the configured safety limit
    #[error("Either nesting depth {depth} exceeds limit {limit}")]
    UnboundedEitherDepth {
        /// Nesting depth of the rejected tree
        depth: usize,
        /// Configured limit
        limit: usize,
    },

    /// The method registry no longer accepts registrations
    #[error("Registry is frozen, cannot register method: {0}")]
    RegistryFrozen(String),

    /// A type descriptor or schema document is malformed
    #[error("Invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),

    /// A method name was registered twice with different signatures
    #[error("Method already registered: {0}")]
    DuplicateMethod(String),

    /// Serializing a message to text failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected failure that fits no other category
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

impl Error {
    /// Build a type mismatch at the current position
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            path: String::new(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True for the errors produced when a value does not fit a descriptor
    ///
    /// The matcher moves on to the next Either leaf only for these; anything
    /// else (such as an over-deep nested Either) aborts the decode.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. } | Error::NoVariantMatched { .. }
        )
    }

    /// Prefix the JSON pointer of a mismatch with one more segment
    ///
    /// Other error kinds are returned untouched.
    pub fn within(mut self, segment: &str) -> Self {
        if let Error::TypeMismatch { path, .. } | Error::NoVariantMatched { path, .. } = &mut self {
            let escaped = segment.replace('~', "~0").replace('/', "~1");
            path.insert_str(0, &format!("/{}", escaped));
        }
        self
    }

    /// JSON pointer of a mismatch, if this is one
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::TypeMismatch { path, .. } | Error::NoVariantMatched { path, .. } => {
                Some(path.as_str())
            }
            _ => None,
        }
    }

    /// Wire code this error is reported under
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Parse(_) => ErrorCode::ParseError,
            Error::InvalidEnvelope(_) => ErrorCode::InvalidRequest,
            Error::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Error::TypeMismatch { .. } | Error::NoVariantMatched { .. } => ErrorCode::InvalidParams,
            _ => ErrorCode::InternalError,
        }
    }

    /// Convert into the error object sent back to a peer
    pub fn to_response_error(&self) -> ResponseError {
        ResponseError::new(self.code().code(), self.to_string())
    }
}

/// Error codes understood by the protocol
///
/// Conversion to and from `i32` is lossless: unknown codes survive as
/// `Other`, so application-specific codes round-trip untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// -32700
    ParseError,
    /// -32600
    InvalidRequest,
    /// -32601
    MethodNotFound,
    /// -32602
    InvalidParams,
    /// -32603
    InternalError,
    /// -32002, request received before `initialize`
    ServerNotInitialized,
    /// -32001
    UnknownErrorCode,
    /// -32800, the client cancelled the request
    RequestCancelled,
    /// -32801, the document changed while the request ran
    ContentModified,
    /// Any application-specific code
    Other(i32),
}

impl ErrorCode {
    /// Numeric wire value
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerNotInitialized => -32002,
            ErrorCode::UnknownErrorCode => -32001,
            ErrorCode::RequestCancelled => -32800,
            ErrorCode::ContentModified => -32801,
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            -32002 => ErrorCode::ServerNotInitialized,
            -32001 => ErrorCode::UnknownErrorCode,
            -32800 => ErrorCode::RequestCancelled,
            -32801 => ErrorCode::ContentModified,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Wire-format error object of a failed response
///
/// Serialized as `{"code": <int>, "message": <string>, "data"?: <any>}`;
/// `data` is omitted entirely when absent. An explicit `"data": null`
/// is kept as `Some(Value::Null)` and written back as `null`.
///
/// # Examples
///
/// ```rust
/// use polyrow_core::ResponseError;
/// use serde_json::json;
///
/// let error = ResponseError::invalid_request("Could not parse request.");
/// assert_eq!(error.code, -32600);
///
/// let custom = ResponseError::with_data(1001, "Out of range", json!({"line": 40}));
/// assert!(custom.data.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Numeric error code
    pub code: i32,

    /// Short human-readable description
    pub message: String,

    /// Optional structured detail, passed through untouched
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<serde_json::Value>,
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl ResponseError {
    /// Create an error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(ErrorCode::ParseError.code(), "Parse error")
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest.code(), msg)
    }

    /// Create a method not found error (-32601)
    ///
    /// ```rust
    /// use polyrow_core::ResponseError;
    ///
    /// let error = ResponseError::method_not_found("workspace/foo");
    /// assert_eq!(error.message, "Method not found: workspace/foo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MethodNotFound.code(),
            format!("Method not found: {}", method.into()),
        )
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams.code(), msg)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError.code(), msg)
    }

    /// Create a request cancelled error (-32800)
    pub fn request_cancelled(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestCancelled.code(), msg)
    }

    /// Typed view of the numeric code
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }
}

impl std::fmt::Display for ResponseError {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ResponseError {}

/// A message that could not be decoded, with whatever envelope was readable
///
/// Decoding fails per message, never per process. When the envelope itself
/// could be read (kind, `id`, `method`, raw payload) it travels with the
/// error in `header`, so the caller can still answer a request or report the
/// failure for a notification.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct DecodeError {
    /// What went wrong
    pub error: Error,
    /// Envelope fields read before the failure, if any
    pub header: Option<EnvelopeHeader>,
}

impl DecodeError {
    /// Pair an error with an optional envelope header
    pub fn new(error: Error, header: Option<EnvelopeHeader>) -> Self {
        Self { error, header }
    }

    /// Kind of message that failed, when it could be determined
    pub fn kind(&self) -> Option<MessageKind> {
        self.header.as_ref().map(|h| h.kind)
    }

    /// Error response to send back, if the failed message expects one
    ///
    /// Requests get a reply carrying their `id`. Input whose kind could not
    /// be determined gets a reply with a `null` id, as JSON-RPC prescribes.
    /// Notifications and responses have no reply channel and yield `None`.
    pub fn reply(&self) -> Option<ResponseMessage> {
        match &self.header {
            Some(header) => match header.kind {
                MessageKind::Request => Some(ResponseMessage::failure(
                    self.error.to_response_error(),
                    header.id.clone(),
                )),
                MessageKind::Notification | MessageKind::Response => None,
            },
            None => Some(ResponseMessage::failure(
                self.error.to_response_error(),
                Option::<Id>::None,
            )),
        }
    }
}

impl From<Error> for DecodeError {
    fn from(error: Error) -> Self {
        Self::new(error, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes_map_per_kind() {
        let cases = vec![
            (Error::Parse("eof".into()), -32700),
            (Error::InvalidEnvelope("both result and error".into()), -32600),
            (Error::MethodNotFound("foo".into()), -32601),
            (Error::mismatch("number", "string"), -32602),
            (
                Error::NoVariantMatched {
                    path: String::new(),
                    expected: "either<string, number>".into(),
                    found: "boolean".into(),
                },
                -32602,
            ),
            (Error::RegistryFrozen("foo".into()), -32603),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_response_error().code, expected, "{}", error);
        }
    }

    #[test]
    fn test_within_builds_json_pointer() {
        let error = Error::mismatch("number", "string")
            .within("line")
            .within("0")
            .within("a/b");

        assert_eq!(error.path(), Some("/a~1b/0/line"));
        assert!(error.to_string().contains("/a~1b/0/line"));
    }

    #[test]
    fn test_within_ignores_other_kinds() {
        let error = Error::Parse("bad".into()).within("params");
        assert_eq!(error, Error::Parse("bad".into()));
        assert_eq!(error.path(), None);
    }

    #[test]
    fn test_root_path_displays_as_slash() {
        let error = Error::mismatch("object", "array");
        assert_eq!(
            error.to_string(),
            "Type mismatch at /: expected object, found array"
        );
    }

    #[test]
    fn test_error_code_roundtrip() {
        for code in [-32700, -32600, -32601, -32602, -32603, -32002, -32001, -32800, -32801, 7] {
            assert_eq!(i32::from(ErrorCode::from(code)), code);
        }
        assert_eq!(ErrorCode::from(42), ErrorCode::Other(42));
    }

    #[test]
    fn test_response_error_serialization_omits_data() {
        let error = ResponseError::invalid_request("Could not parse request.");
        let serialized = serde_json::to_string(&error).unwrap();

        assert_eq!(
            serialized,
            r#"{"code":-32600,"message":"Could not parse request."}"#
        );
    }

    #[test]
    fn test_response_error_with_data_roundtrip() {
        let error = ResponseError::with_data(-32000, "Test error", json!({"key": "value"}));
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: ResponseError = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, error);
    }

    #[test]
    fn test_response_error_keeps_null_data() {
        let error: ResponseError =
            serde_json::from_str(r#"{"code":-32000,"message":"x","data":null}"#).unwrap();
        assert_eq!(error.data, Some(serde_json::Value::Null));
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"code":-32000,"message":"x","data":null}"#
        );

        let absent: ResponseError = serde_json::from_str(r#"{"code":-32000,"message":"x"}"#).unwrap();
        assert_eq!(absent.data, None);
    }

    #[test]
    fn test_response_error_display() {
        let error = ResponseError::method_not_found("unknownMethod");
        assert_eq!(error.to_string(), "[-32601] Method not found: unknownMethod");
        assert_eq!(error.error_code(), ErrorCode::MethodNotFound);
    }

    #[test]
    fn test_decode_error_reply_for_request() {
        let header = EnvelopeHeader {
            kind: MessageKind::Request,
            id: Some(Id::String("7".into())),
            method: Some("foo".into()),
            payload: None,
        };
        let failure = DecodeError::new(Error::MethodNotFound("foo".into()), Some(header));

        let reply = failure.reply().unwrap();
        assert_eq!(reply.id, Some(Id::String("7".into())));
        assert_eq!(reply.error().map(|e| e.code), Some(-32601));
    }

    #[test]
    fn test_decode_error_no_reply_for_notification() {
        let header = EnvelopeHeader {
            kind: MessageKind::Notification,
            id: None,
            method: Some("foo".into()),
            payload: None,
        };
        let failure = DecodeError::new(Error::MethodNotFound("foo".into()), Some(header));

        assert!(failure.reply().is_none());
    }

    #[test]
    fn test_decode_error_reply_without_header_uses_null_id() {
        let failure = DecodeError::from(Error::Parse("eof".into()));
        let reply = failure.reply().unwrap();

        assert_eq!(reply.id, None);
        assert_eq!(reply.error().map(|e| e.code), Some(-32700));
    }
}
