//! Shared protocol and helpers for endpoint tests

#![allow(dead_code)]

use polyrow_core::{MethodRegistry, ObjectType, ObjectValue, TypeDescriptor, TypedValue};
use polyrow_endpoint::Endpoint;
use std::sync::Arc;

pub fn position() -> TypeDescriptor {
    ObjectType::builder("Position")
        .required("line", TypeDescriptor::number())
        .required("character", TypeDescriptor::number())
        .build()
        .unwrap()
}

pub fn markup_content() -> TypeDescriptor {
    ObjectType::builder("MarkupContent")
        .required("kind", TypeDescriptor::string())
        .required("value", TypeDescriptor::string())
        .build()
        .unwrap()
}

pub fn hover_params() -> TypeDescriptor {
    let document = ObjectType::builder("TextDocumentIdentifier")
        .required("uri", TypeDescriptor::string())
        .build()
        .unwrap();

    ObjectType::builder("TextDocumentPositionParams")
        .required("textDocument", document)
        .required("position", position())
        .build()
        .unwrap()
}

pub fn hover() -> TypeDescriptor {
    ObjectType::builder("Hover")
        .required(
            "contents",
            TypeDescriptor::either(
                TypeDescriptor::array(TypeDescriptor::string()),
                markup_content(),
            ),
        )
        .build()
        .unwrap()
}

pub fn registry() -> Arc<MethodRegistry> {
    MethodRegistry::builder()
        .request("textDocument/hover", vec![hover_params()], hover())
        .notification(
            "window/logMessage",
            vec![ObjectType::builder("LogMessageParams")
                .required("type", TypeDescriptor::number())
                .required("message", TypeDescriptor::string())
                .build()
                .unwrap()],
        )
        .request("shutdown", vec![], TypeDescriptor::null())
        .notification("exit", vec![])
        .build()
        .unwrap()
}

/// A client and a server speaking the same protocol
pub fn pair() -> (Endpoint, Endpoint) {
    let registry = registry();
    (Endpoint::new(registry.clone()), Endpoint::new(registry))
}

pub fn hover_request_params(line: i64) -> TypedValue {
    ObjectValue::new()
        .with("textDocument", ObjectValue::new().with("uri", "file:///tmp/foo.rs"))
        .with(
            "position",
            ObjectValue::new().with("line", line).with("character", 3i64),
        )
        .into()
}

pub fn markup(value: &str) -> TypedValue {
    ObjectValue::new()
        .with(
            "contents",
            ObjectValue::new().with("kind", "markdown").with("value", value),
        )
        .into()
}
