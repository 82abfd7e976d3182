//! Protocol descriptions loaded from JSON
//!
//! A schema document lists named types and the methods that use them, so a
//! protocol can be described in data rather than in code:
//!
//! ```json
//! {
//!   "types": {
//!     "Position": {"kind": "object", "properties": [
//!       {"name": "line", "type": {"kind": "number"}},
//!       {"name": "character", "type": {"kind": "number"}}
//!     ]}
//!   },
//!   "methods": [
//!     {"name": "test/position", "params": [{"kind": "ref", "name": "Position"}],
//!      "result": {"kind": "ref", "name": "Position"}}
//!   ]
//! }
//! ```
//!
//! References are inlined when the schema is turned into descriptors.
//! Descriptors are finite trees, so a reference cycle is an error.

use crate::codec::CodecConfig;
use crate::descriptor::{ObjectType, Property, TypeDescriptor};
use crate::error::{Error, Result};
use crate::registry::{MethodRegistration, MethodRegistry, RegistryBuilder};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Type expression of a schema document, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeSpec {
    String,
    Number,
    Boolean,
    Null,
    Any,
    Array {
        items: Box<TypeSpec>,
    },
    Map {
        values: Box<TypeSpec>,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        properties: Vec<PropertySpec>,
    },
    Either {
        left: Box<TypeSpec>,
        right: Box<TypeSpec>,
    },
    Ref {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TypeSpec>,
    #[serde(default)]
    pub notification: bool,
}

/// A whole protocol description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSchema {
    #[serde(default)]
    pub types: IndexMap<String, TypeSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

impl ProtocolSchema {
    /// Parse a schema document
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::InvalidTypeDescriptor(format!("malformed schema: {}", e)))
    }

    /// Descriptor of the named type, references inlined
    pub fn descriptor(&self, name: &str) -> Result<TypeDescriptor> {
        Resolver::new(self).named(name)
    }

    /// Resolve every method signature
    pub fn registrations(&self) -> Result<Vec<MethodRegistration>> {
        let mut resolver = Resolver::new(self);
        self.methods
            .iter()
            .map(|method| {
                let params = method
                    .params
                    .iter()
                    .map(|spec| resolver.resolve(spec, None))
                    .collect::<Result<Vec<_>>>()?;
                let result = match (&method.result, method.notification) {
                    (_, true) => None,
                    (Some(spec), false) => Some(resolver.resolve(spec, None)?),
                    (None, false) => Some(TypeDescriptor::null()),
                };
                Ok(MethodRegistration::new(
                    method.name.clone(),
                    params,
                    result,
                    method.notification,
                ))
            })
            .collect()
    }

    /// Build a frozen registry with the default codec settings
    pub fn into_registry(self) -> Result<Arc<MethodRegistry>> {
        self.into_registry_with(CodecConfig::default())
    }

    pub fn into_registry_with(self, config: CodecConfig) -> Result<Arc<MethodRegistry>> {
        self.registrations()?
            .into_iter()
            .fold(RegistryBuilder::new().config(config), RegistryBuilder::method)
            .build()
    }
}

struct Resolver<'a> {
    schema: &'a ProtocolSchema,
    resolved: HashMap<String, TypeDescriptor>,
    in_progress: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(schema: &'a ProtocolSchema) -> Self {
        Self {
            schema,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    fn named(&mut self, name: &str) -> Result<TypeDescriptor> {
        if let Some(descriptor) = self.resolved.get(name) {
            return Ok(descriptor.clone());
        }
        if self.in_progress.iter().any(|n| n == name) {
            return Err(Error::InvalidTypeDescriptor(format!(
                "reference cycle: {} -> {}",
                self.in_progress.join(" -> "),
                name
            )));
        }
        let schema = self.schema;
        let spec = schema
            .types
            .get(name)
            .ok_or_else(|| Error::InvalidTypeDescriptor(format!("unknown type '{}'", name)))?;

        self.in_progress.push(name.to_string());
        let descriptor = self.resolve(spec, Some(name));
        self.in_progress.pop();

        let descriptor = descriptor?;
        self.resolved.insert(name.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    fn resolve(&mut self, spec: &TypeSpec, name: Option<&str>) -> Result<TypeDescriptor> {
        Ok(match spec {
            TypeSpec::String => TypeDescriptor::string(),
            TypeSpec::Number => TypeDescriptor::number(),
            TypeSpec::Boolean => TypeDescriptor::boolean(),
            TypeSpec::Null => TypeDescriptor::null(),
            TypeSpec::Any => TypeDescriptor::any(),
            TypeSpec::Array { items } => TypeDescriptor::array(self.resolve(items, None)?),
            TypeSpec::Map { values } => TypeDescriptor::map(self.resolve(values, None)?),
            TypeSpec::Either { left, right } => {
                TypeDescriptor::either(self.resolve(left, None)?, self.resolve(right, None)?)
            }
            TypeSpec::Ref { name } => self.named(name)?,
            TypeSpec::Object {
                name: declared,
                properties,
            } => {
                let properties = properties
                    .iter()
                    .map(|p| {
                        self.resolve(&p.ty, None)
                            .map(|ty| Property::new(p.name.clone(), ty, !p.optional))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let label = declared.clone().or_else(|| name.map(str::to_string));
                TypeDescriptor::Object(ObjectType::new(label, properties)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LSP_SUBSET: &str = r#"{
        "types": {
            "Position": {"kind": "object", "properties": [
                {"name": "line", "type": {"kind": "number"}},
                {"name": "character", "type": {"kind": "number"}}
            ]},
            "MarkupContent": {"kind": "object", "properties": [
                {"name": "kind", "type": {"kind": "string"}},
                {"name": "value", "type": {"kind": "string"}}
            ]},
            "Hover": {"kind": "object", "properties": [
                {"name": "contents", "type": {"kind": "either",
                    "left": {"kind": "array", "items": {"kind": "string"}},
                    "right": {"kind": "ref", "name": "MarkupContent"}}},
                {"name": "range", "type": {"kind": "any"}, "optional": true}
            ]}
        },
        "methods": [
            {"name": "textDocument/hover", "params": [{"kind": "ref", "name": "Position"}],
             "result": {"kind": "ref", "name": "Hover"}},
            {"name": "shutdown"},
            {"name": "exit", "notification": true}
        ]
    }"#;

    #[test]
    fn test_named_descriptor() {
        let schema = ProtocolSchema::from_json_str(LSP_SUBSET).unwrap();
        let hover = schema.descriptor("Hover").unwrap();

        assert_eq!(
            hover.describe(),
            "Hover"
        );
        let contents = hover.as_object().unwrap().property("contents").unwrap();
        assert_eq!(contents.ty().describe(), "either<array<string>, MarkupContent>");
        assert!(!hover.as_object().unwrap().property("range").unwrap().is_required());
    }

    #[test]
    fn test_into_registry() {
        let registry = ProtocolSchema::from_json_str(LSP_SUBSET)
            .unwrap()
            .into_registry()
            .unwrap();

        assert!(registry.is_frozen());
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.lookup("shutdown").unwrap().result(),
            Some(&TypeDescriptor::null())
        );
        assert!(registry.lookup("exit").unwrap().result().is_none());
        assert_eq!(registry.resolver().cached_len(), 1);
    }

    #[test]
    fn test_unknown_reference() {
        let schema: ProtocolSchema = serde_json::from_value(json!({
            "methods": [{"name": "m", "params": [{"kind": "ref", "name": "Nope"}]}]
        }))
        .unwrap();

        match schema.registrations() {
            Err(Error::InvalidTypeDescriptor(msg)) => assert!(msg.contains("Nope")),
            other => panic!("Expected InvalidTypeDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_cycle() {
        let schema: ProtocolSchema = serde_json::from_value(json!({
            "types": {
                "Node": {"kind": "object", "properties": [
                    {"name": "children", "type": {"kind": "array", "items": {"kind": "ref", "name": "Node"}}}
                ]}
            }
        }))
        .unwrap();

        match schema.descriptor("Node") {
            Err(Error::InvalidTypeDescriptor(msg)) => assert!(msg.contains("cycle")),
            other => panic!("Expected InvalidTypeDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_property() {
        let schema: ProtocolSchema = serde_json::from_value(json!({
            "types": {
                "Broken": {"kind": "object", "properties": [
                    {"name": "a", "type": {"kind": "string"}},
                    {"name": "a", "type": {"kind": "number"}}
                ]}
            }
        }))
        .unwrap();

        assert!(matches!(
            schema.descriptor("Broken"),
            Err(Error::InvalidTypeDescriptor(_))
        ));
    }

    #[test]
    fn test_shared_reference_resolved_once() {
        let schema: ProtocolSchema = serde_json::from_value(json!({
            "types": {
                "Position": {"kind": "object", "properties": [
                    {"name": "line", "type": {"kind": "number"}}
                ]},
                "Range": {"kind": "object", "properties": [
                    {"name": "start", "type": {"kind": "ref", "name": "Position"}},
                    {"name": "end", "type": {"kind": "ref", "name": "Position"}}
                ]}
            }
        }))
        .unwrap();

        let range = schema.descriptor("Range").unwrap();
        let object = range.as_object().unwrap();
        assert_eq!(object.property("start").unwrap().ty(), object.property("end").unwrap().ty());
    }

    #[test]
    fn test_malformed_document() {
        let result = ProtocolSchema::from_json_str(r#"{"types": {"X": {"kind": "tuple"}}}"#);
        assert!(matches!(result, Err(Error::InvalidTypeDescriptor(_))));
    }
}
