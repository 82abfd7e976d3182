//! Type-directed matching between JSON and typed values
//!
//! [`Matcher::decode`] checks a JSON value against a descriptor and builds the
//! matching [`TypedValue`]. [`Matcher::encode_as`] is the inverse, checking
//! a typed value against the descriptor it claims to conform to.
//!
//! # Decode rules
//!
//! - Scalars accept exactly their JSON kind (`"4"` is not a number)
//! - Objects need every required property; unknown properties are kept
//! - Arrays and maps decode every element against the element descriptor
//! - Eithers try their leaves in resolver order; the first success wins and
//!   a failure inside a leaf is never retried with a partial match
//!
//! Mismatches carry a JSON pointer to the offending value, e.g.
//! `/contents/1/language`.

use crate::descriptor::{EitherType, ObjectType, TypeDescriptor};
use crate::either::{Branch, EitherResolver};
use crate::error::{Error, Result};
use crate::value::{json_kind, ObjectValue, TypedValue};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Decodes and encodes values against descriptors
///
/// Cloning is cheap; clones share the Either resolution cache.
#[derive(Debug, Clone)]
pub struct Matcher {
    resolver: Arc<EitherResolver>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(Arc::new(EitherResolver::new()))
    }
}

impl Matcher {
    pub fn new(resolver: Arc<EitherResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<EitherResolver> {
        &self.resolver
    }

    /// True if `value` decodes against `descriptor`
    pub fn accepts(&self, value: &Value, descriptor: &TypeDescriptor) -> bool {
        self.decode(value, descriptor).is_ok()
    }

    /// Decode `value` as `descriptor`
    ///
    /// # Errors
    ///
    /// `TypeMismatch` or `NoVariantMatched` when the value does not conform,
    /// `UnboundedEitherDepth` when an Either in the descriptor is too deep.
    pub fn decode(&self, value: &Value, descriptor: &TypeDescriptor) -> Result<TypedValue> {
        match descriptor {
            TypeDescriptor::Any => Ok(TypedValue::Raw(value.clone())),
            TypeDescriptor::Scalar(kind) => {
                if !kind.accepts(value) {
                    return Err(Error::mismatch(kind.name(), json_kind(value)));
                }
                Ok(match value {
                    Value::Bool(b) => TypedValue::Bool(*b),
                    Value::Number(n) => TypedValue::Number(n.clone()),
                    Value::String(s) => TypedValue::String(s.clone()),
                    _ => TypedValue::Null,
                })
            }
            TypeDescriptor::Array(array) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| Error::mismatch(descriptor.describe(), json_kind(value)))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.decode(item, array.element())
                            .map_err(|e| e.within(&i.to_string()))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(TypedValue::Array)
            }
            TypeDescriptor::Map(map) => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| Error::mismatch(descriptor.describe(), json_kind(value)))?;
                entries
                    .iter()
                    .map(|(key, item)| {
                        self.decode(item, map.value())
                            .map(|decoded| (key.clone(), decoded))
                            .map_err(|e| e.within(key))
                    })
                    .collect::<Result<IndexMap<_, _>>>()
                    .map(TypedValue::Map)
            }
            TypeDescriptor::Object(object) => {
                let fields = value
                    .as_object()
                    .ok_or_else(|| Error::mismatch(descriptor.describe(), json_kind(value)))?;
                self.decode_object(fields, object).map(TypedValue::Object)
            }
            TypeDescriptor::Either(either) => self.decode_either(value, either, descriptor),
        }
    }

    fn decode_object(&self, fields: &Map<String, Value>, object: &ObjectType) -> Result<ObjectValue> {
        let mut decoded = ObjectValue::new();

        for property in object.properties() {
            match fields.get(property.name()) {
                None if property.is_required() => {
                    return Err(
                        Error::mismatch(property.ty().describe(), "absent").within(property.name())
                    );
                }
                None => {}
                Some(Value::Null) if !property.is_required() && !property.ty().accepts_null() => {}
                Some(field) => {
                    let value = self
                        .decode(field, property.ty())
                        .map_err(|e| e.within(property.name()))?;
                    decoded.insert(property.name(), value);
                }
            }
        }

        for (name, field) in fields {
            if !object.has_property(name) {
                decoded.insert_extra(name.clone(), field.clone());
            }
        }

        Ok(decoded)
    }

    fn decode_either(
        &self,
        value: &Value,
        either: &EitherType,
        descriptor: &TypeDescriptor,
    ) -> Result<TypedValue> {
        let resolved = self.resolver.resolve(either)?;

        for path in resolved.paths() {
            match self.decode(value, path.leaf()) {
                Ok(leaf) => return Ok(path.wrap(leaf)),
                Err(e) if e.is_mismatch() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::NoVariantMatched {
            path: String::new(),
            expected: descriptor.describe(),
            found: json_kind(value).to_string(),
        })
    }

    /// Structural JSON form of `value`, Either tags dropped
    pub fn encode(&self, value: &TypedValue) -> Value {
        value.to_json()
    }

    /// Encode `value`, checking that it conforms to `descriptor`
    ///
    /// Untagged values under an Either are matched against its leaves in
    /// resolver order. A required property that is missing is written as
    /// `null` when its descriptor accepts `null`. An optional property holding
    /// `Null` is left out when its descriptor does not accept `null`.
    pub fn encode_as(&self, value: &TypedValue, descriptor: &TypeDescriptor) -> Result<Value> {
        if let TypeDescriptor::Any = descriptor {
            return Ok(value.to_json());
        }
        if let TypedValue::Raw(raw) = value {
            self.decode(raw, descriptor)?;
            return Ok(raw.clone());
        }

        match (descriptor, value) {
            (TypeDescriptor::Either(either), _) => self.encode_either(value, either, descriptor),
            (_, TypedValue::Either(tagged)) => {
                Err(Error::mismatch(descriptor.describe(), tagged.leaf().kind_name()))
            }
            (TypeDescriptor::Scalar(kind), _) => {
                let json = value.to_json();
                if kind.accepts(&json) {
                    Ok(json)
                } else {
                    Err(Error::mismatch(kind.name(), value.kind_name()))
                }
            }
            (TypeDescriptor::Array(array), TypedValue::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.encode_as(item, array.element())
                        .map_err(|e| e.within(&i.to_string()))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (TypeDescriptor::Map(map), TypedValue::Map(entries)) => entries
                .iter()
                .map(|(key, item)| {
                    self.encode_as(item, map.value())
                        .map(|encoded| (key.clone(), encoded))
                        .map_err(|e| e.within(key))
                })
                .collect::<Result<Map<_, _>>>()
                .map(Value::Object),
            (TypeDescriptor::Object(object), TypedValue::Object(fields)) => {
                self.encode_object(fields, object).map(Value::Object)
            }
            _ => Err(Error::mismatch(descriptor.describe(), value.kind_name())),
        }
    }

    fn encode_object(&self, value: &ObjectValue, object: &ObjectType) -> Result<Map<String, Value>> {
        let mut encoded = Map::new();

        for property in object.properties() {
            let name = property.name();
            match value.get(name) {
                Some(TypedValue::Null) if !property.is_required() && !property.ty().accepts_null() => {}
                Some(field) => {
                    let json = self
                        .encode_as(field, property.ty())
                        .map_err(|e| e.within(name))?;
                    encoded.insert(name.to_string(), json);
                }
                None if property.is_required() && property.ty().accepts_null() => {
                    encoded.insert(name.to_string(), Value::Null);
                }
                None if property.is_required() => {
                    return Err(Error::mismatch(property.ty().describe(), "absent").within(name));
                }
                None => {}
            }
        }

        for (name, field) in value.fields() {
            if !object.has_property(name) {
                encoded.insert(name.clone(), field.to_json());
            }
        }
        for (name, field) in value.extra() {
            if !encoded.contains_key(name) {
                encoded.insert(name.clone(), field.clone());
            }
        }

        Ok(encoded)
    }

    fn encode_either(
        &self,
        value: &TypedValue,
        either: &EitherType,
        descriptor: &TypeDescriptor,
    ) -> Result<Value> {
        if let TypedValue::Either(tagged) = value {
            let branch = match tagged.branch() {
                Branch::Left => either.left(),
                Branch::Right => either.right(),
            };
            return self.encode_as(tagged.value(), branch);
        }

        let resolved = self.resolver.resolve(either)?;
        for path in resolved.paths() {
            match self.encode_as(value, path.leaf()) {
                Ok(json) => return Ok(json),
                Err(e) if e.is_mismatch() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::NoVariantMatched {
            path: String::new(),
            expected: descriptor.describe(),
            found: value.kind_name().to_string(),
        })
    }
}
