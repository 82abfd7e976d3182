//! Typed values produced by the matcher
//!
//! A [`TypedValue`] mirrors the descriptor it was decoded against. Either
//! fields become [`EitherValue`]s tagged with the branch taken, nested once
//! per Either level, so the variant chosen on decode is preserved for
//! re-encoding. On the wire the tag is invisible: encoding an `EitherValue`
//! emits only its payload.
//!
//! Opaque payloads (descriptor `any`) are kept as [`TypedValue::Raw`].

use crate::either::Branch;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};

/// A decoded protocol value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<TypedValue>),
    /// Values of a map descriptor, keys in arrival order
    Map(IndexMap<String, TypedValue>),
    Object(ObjectValue),
    Either(EitherValue),
    /// Opaque JSON, passed through untouched
    Raw(Value),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, TypedValue>> {
        match self {
            TypedValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            TypedValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_either(&self) -> Option<&EitherValue> {
        match self {
            TypedValue::Either(either) => Some(either),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            TypedValue::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    /// Value with every Either tag peeled off
    pub fn untagged(&self) -> &TypedValue {
        match self {
            TypedValue::Either(either) => either.leaf(),
            other => other,
        }
    }

    /// JSON kind this value encodes to
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "boolean",
            TypedValue::Number(_) => "number",
            TypedValue::String(_) => "string",
            TypedValue::Array(_) => "array",
            TypedValue::Map(_) | TypedValue::Object(_) => "object",
            TypedValue::Either(either) => either.leaf().kind_name(),
            TypedValue::Raw(raw) => json_kind(raw),
        }
    }

    /// Structural JSON form, Either tags dropped
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Number(n) => Value::Number(n.clone()),
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            TypedValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            TypedValue::Object(object) => Value::Object(object.to_json_map()),
            TypedValue::Either(either) => either.value().to_json(),
            TypedValue::Raw(raw) => raw.clone(),
        }
    }
}

/// JSON kind name of a raw value
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Null => serializer.serialize_unit(),
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::Number(n) => n.serialize(serializer),
            TypedValue::String(s) => serializer.serialize_str(s),
            TypedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TypedValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            TypedValue::Object(object) => {
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in &object.fields {
                    map.serialize_entry(key, value)?;
                }
                for (key, value) in &object.extra {
                    if !object.fields.contains_key(key) {
                        map.serialize_entry(key, value)?;
                    }
                }
                map.end()
            }
            TypedValue::Either(either) => either.value().serialize(serializer),
            TypedValue::Raw(raw) => raw.serialize(serializer),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<i64> for TypedValue {
    fn from(n: i64) -> Self {
        TypedValue::Number(n.into())
    }
}

impl From<u32> for TypedValue {
    fn from(n: u32) -> Self {
        TypedValue::Number(n.into())
    }
}

impl From<f64> for TypedValue {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        Number::from_f64(n)
            .map(TypedValue::Number)
            .unwrap_or(TypedValue::Null)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(items: Vec<TypedValue>) -> Self {
        TypedValue::Array(items)
    }
}

impl From<ObjectValue> for TypedValue {
    fn from(object: ObjectValue) -> Self {
        TypedValue::Object(object)
    }
}

impl From<EitherValue> for TypedValue {
    fn from(either: EitherValue) -> Self {
        TypedValue::Either(either)
    }
}

impl From<Value> for TypedValue {
    fn from(raw: Value) -> Self {
        TypedValue::Raw(raw)
    }
}

/// Value of an object descriptor
///
/// `fields` holds the declared properties that were present. Properties the
/// descriptor does not know are kept verbatim in `extra`, in arrival order,
/// and written back after the declared ones.
///
/// # Examples
///
/// ```rust
/// use polyrow_core::ObjectValue;
///
/// let position = ObjectValue::new().with("line", 4i64).with("character", 22i64);
/// assert_eq!(position.get("line").and_then(|v| v.as_i64()), Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    fields: IndexMap<String, TypedValue>,
    extra: Map<String, Value>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Builder-style `insert_extra`
    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert_extra(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TypedValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn insert_extra(&mut self, name: impl Into<String>, value: Value) {
        self.extra.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<TypedValue> {
        self.fields.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &IndexMap<String, TypedValue> {
        &self.fields
    }

    /// Properties unknown to the descriptor
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.extra.is_empty()
    }

    fn to_json_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        for (key, value) in &self.extra {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        map
    }
}

/// A value tagged with the Either branch it matched
///
/// For nested Eithers the payload is itself an `EitherValue`, one level per
/// Either, ending at a leaf value.
///
/// # Examples
///
/// ```rust
/// use polyrow_core::{Branch, EitherValue, TypedValue};
///
/// // either<either<string, number>, ...> holding a number
/// let value = EitherValue::left(EitherValue::right(7i64));
/// assert_eq!(value.path(), vec![Branch::Left, Branch::Right]);
/// assert_eq!(value.leaf(), &TypedValue::from(7i64));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EitherValue {
    branch: Branch,
    value: Box<TypedValue>,
}

impl EitherValue {
    pub fn new(branch: Branch, value: impl Into<TypedValue>) -> Self {
        Self {
            branch,
            value: Box::new(value.into()),
        }
    }

    pub fn left(value: impl Into<TypedValue>) -> Self {
        Self::new(Branch::Left, value)
    }

    pub fn right(value: impl Into<TypedValue>) -> Self {
        Self::new(Branch::Right, value)
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn is_left(&self) -> bool {
        self.branch.is_left()
    }

    pub fn is_right(&self) -> bool {
        self.branch.is_right()
    }

    /// Payload one level down, possibly another `EitherValue`
    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    pub fn into_value(self) -> TypedValue {
        *self.value
    }

    /// Choices from this level down to the leaf
    pub fn path(&self) -> Vec<Branch> {
        let mut path = vec![self.branch];
        let mut current = self.value.as_ref();
        while let TypedValue::Either(inner) = current {
            path.push(inner.branch);
            current = inner.value.as_ref();
        }
        path
    }

    /// Innermost non-Either payload
    pub fn leaf(&self) -> &TypedValue {
        let mut current = self.value.as_ref();
        while let TypedValue::Either(inner) = current {
            current = inner.value.as_ref();
        }
        current
    }
}
