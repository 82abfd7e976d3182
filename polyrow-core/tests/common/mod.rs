//! Language-server shaped fixtures shared by the integration tests

#![allow(dead_code)]

use polyrow_core::{MethodRegistry, ObjectType, TypeDescriptor};
use std::sync::Arc;

pub fn position() -> TypeDescriptor {
    ObjectType::builder("Position")
        .required("line", TypeDescriptor::number())
        .required("character", TypeDescriptor::number())
        .build()
        .unwrap()
}

pub fn range() -> TypeDescriptor {
    ObjectType::builder("Range")
        .required("start", position())
        .required("end", position())
        .build()
        .unwrap()
}

pub fn text_document_identifier() -> TypeDescriptor {
    ObjectType::builder("TextDocumentIdentifier")
        .required("uri", TypeDescriptor::string())
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

pub fn marked_string() -> TypeDescriptor {
    ObjectType::builder("MarkedString")
        .required("language", TypeDescriptor::string())
        .required("value", TypeDescriptor::string())
        .build()
        .unwrap()
}

/// `Either<Array<Either<string, MarkedString>>, MarkupContent>`
pub fn hover_contents() -> TypeDescriptor {
    TypeDescriptor::either(
        TypeDescriptor::array(TypeDescriptor::either(
            TypeDescriptor::string(),
            marked_string(),
        )),
        markup_content(),
    )
}

pub fn hover() -> TypeDescriptor {
    ObjectType::builder("Hover")
        .required("contents", hover_contents())
        .optional("range", range())
        .build()
        .unwrap()
}

pub fn hover_without_range() -> TypeDescriptor {
    ObjectType::builder("Hover")
        .required("contents", hover_contents())
        .build()
        .unwrap()
}

pub fn text_document_position_params() -> TypeDescriptor {
    ObjectType::builder("TextDocumentPositionParams")
        .required("textDocument", text_document_identifier())
        .required("position", position())
        .build()
        .unwrap()
}

pub fn completion_item() -> TypeDescriptor {
    ObjectType::builder("CompletionItem")
        .required("label", TypeDescriptor::string())
        .optional("kind", TypeDescriptor::number())
        .optional("detail", TypeDescriptor::string())
        .build()
        .unwrap()
}

pub fn completion_list() -> TypeDescriptor {
    ObjectType::builder("CompletionList")
        .required("isIncomplete", TypeDescriptor::boolean())
        .required("items", TypeDescriptor::array(completion_item()))
        .build()
        .unwrap()
}

pub fn initialize_params() -> TypeDescriptor {
    ObjectType::builder("InitializeParams")
        .required("processId", TypeDescriptor::nullable(TypeDescriptor::number()))
        .optional("rootUri", TypeDescriptor::nullable(TypeDescriptor::string()))
        .optional("initializationOptions", TypeDescriptor::any())
        .required("capabilities", TypeDescriptor::map(TypeDescriptor::any()))
        .optional("trace", TypeDescriptor::string())
        .build()
        .unwrap()
}

pub fn document_formatting_params() -> TypeDescriptor {
    let options = ObjectType::builder("FormattingOptions")
        .required("tabSize", TypeDescriptor::number())
        .required("insertSpaces", TypeDescriptor::boolean())
        .build()
        .unwrap();

    ObjectType::builder("DocumentFormattingParams")
        .required("textDocument", text_document_identifier())
        .required("options", options)
        .build()
        .unwrap()
}

pub fn text_edit() -> TypeDescriptor {
    ObjectType::builder("TextEdit")
        .required("range", range())
        .required("newText", TypeDescriptor::string())
        .build()
        .unwrap()
}

pub fn code_lens() -> TypeDescriptor {
    let command = ObjectType::builder("Command")
        .required("title", TypeDescriptor::string())
        .required("command", TypeDescriptor::string())
        .optional("arguments", TypeDescriptor::array(TypeDescriptor::any()))
        .build()
        .unwrap();

    ObjectType::builder("CodeLens")
        .required("range", range())
        .optional("command", command)
        .optional("data", TypeDescriptor::any())
        .build()
        .unwrap()
}

pub fn registry() -> Arc<MethodRegistry> {
    MethodRegistry::builder()
        .request("initialize", vec![initialize_params()], TypeDescriptor::any())
        .notification("initialized", vec![])
        .request(
            "textDocument/completion",
            vec![text_document_position_params()],
            TypeDescriptor::either(TypeDescriptor::array(completion_item()), completion_list()),
        )
        .request(
            "textDocument/hover",
            vec![text_document_position_params()],
            hover(),
        )
        .request(
            "textDocument/formatting",
            vec![document_formatting_params()],
            TypeDescriptor::array(text_edit()),
        )
        .request(
            "textDocument/codeLens",
            vec![ObjectType::builder("CodeLensParams")
                .required("textDocument", text_document_identifier())
                .build()
                .unwrap()],
            TypeDescriptor::array(code_lens()),
        )
        .notification("telemetry/event", vec![TypeDescriptor::any()])
        .request("test/pair", vec![TypeDescriptor::string(), TypeDescriptor::number()], TypeDescriptor::boolean())
        .request("shutdown", vec![], TypeDescriptor::null())
        .notification("exit", vec![])
        .build()
        .unwrap()
}
