//! Type descriptors: the closed set of shapes a protocol field can take
//!
//! A [`TypeDescriptor`] is an immutable tree built bottom-up from:
//!
//! - **Scalar**: string, number, boolean or null
//! - **Object**: named properties, each required or optional
//! - **Array**: homogeneous list of one element descriptor
//! - **Map**: string-keyed object whose values share one descriptor
//! - **Either**: exactly one of two alternatives, each possibly another Either
//! - **Any**: opaque JSON passed through untouched (vendor data, telemetry)
//!
//! Children are held behind `Arc`, so cloning a descriptor is cheap and a
//! descriptor can never contain itself: a tree is finished before it can be
//! used as a child. Named references, where cycles could occur, only exist in
//! schema documents and are checked when those are resolved (see `schema`).
//!
//! # Equality
//!
//! Equality is structural. Object names are labels for diagnostics and do not
//! take part in it. Either nodes carry a fingerprint computed once at
//! construction, so hashing an Either root is O(1); the Either resolver's cache
//! relies on that.
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{ObjectType, TypeDescriptor};
//!
//! let markup = ObjectType::builder("MarkupContent")
//!     .required("kind", TypeDescriptor::string())
//!     .required("value", TypeDescriptor::string())
//!     .build()
//!     .unwrap();
//!
//! let contents = TypeDescriptor::either(
//!     TypeDescriptor::array(TypeDescriptor::string()),
//!     markup,
//! );
//! assert_eq!(contents.describe(), "either<array<string>, MarkupContent>");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Primitive JSON kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
}

impl ScalarKind {
    /// True if `value` is exactly this primitive kind
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarKind::String, Value::String(_))
                | (ScalarKind::Number, Value::Number(_))
                | (ScalarKind::Boolean, Value::Bool(_))
                | (ScalarKind::Null, Value::Null)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Null => "null",
        }
    }
}

/// Shape of a protocol value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Object(ObjectType),
    Array(ArrayType),
    Map(MapType),
    Either(EitherType),
    /// Any JSON value, kept verbatim
    Any,
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Scalar(ScalarKind::String)
    }

    pub fn number() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Boolean)
    }

    pub fn null() -> Self {
        TypeDescriptor::Scalar(ScalarKind::Null)
    }

    pub fn any() -> Self {
        TypeDescriptor::Any
    }

    /// List of `element`
    pub fn array(element: impl Into<TypeDescriptor>) -> Self {
        TypeDescriptor::Array(ArrayType::new(element))
    }

    /// String-keyed map of `value`
    pub fn map(value: impl Into<TypeDescriptor>) -> Self {
        TypeDescriptor::Map(MapType::new(value))
    }

    /// One of `left` or `right`, tried in that order
    pub fn either(left: impl Into<TypeDescriptor>, right: impl Into<TypeDescriptor>) -> Self {
        TypeDescriptor::Either(EitherType::new(left, right))
    }

    /// `inner` or `null`
    pub fn nullable(inner: impl Into<TypeDescriptor>) -> Self {
        Self::either(inner, Self::null())
    }

    pub fn is_either(&self) -> bool {
        matches!(self, TypeDescriptor::Either(_))
    }

    pub fn as_either(&self) -> Option<&EitherType> {
        match self {
            TypeDescriptor::Either(either) => Some(either),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            TypeDescriptor::Object(object) => Some(object),
            _ => None,
        }
    }

    /// True if JSON `null` is a valid value of this descriptor
    pub fn accepts_null(&self) -> bool {
        match self {
            TypeDescriptor::Scalar(kind) => *kind == ScalarKind::Null,
            TypeDescriptor::Any => true,
            TypeDescriptor::Either(either) => {
                either.left().accepts_null() || either.right().accepts_null()
            }
            _ => false,
        }
    }

    /// Number of directly nested Either levels (0 for any non-Either)
    pub fn either_depth(&self) -> usize {
        match self {
            TypeDescriptor::Either(either) => either.depth(),
            _ => 0,
        }
    }

    /// Short human-readable rendering used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Scalar(kind) => kind.name().to_string(),
            TypeDescriptor::Object(object) => object
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| "object".to_string()),
            TypeDescriptor::Array(array) => format!("array<{}>", array.element().describe()),
            TypeDescriptor::Map(map) => format!("map<{}>", map.value().describe()),
            TypeDescriptor::Either(either) => format!(
                "either<{}, {}>",
                either.left().describe(),
                either.right().describe()
            ),
            TypeDescriptor::Any => "any".to_string(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<ScalarKind> for TypeDescriptor {
    fn from(kind: ScalarKind) -> Self {
        TypeDescriptor::Scalar(kind)
    }
}

impl From<ObjectType> for TypeDescriptor {
    fn from(object: ObjectType) -> Self {
        TypeDescriptor::Object(object)
    }
}

impl From<EitherType> for TypeDescriptor {
    fn from(either: EitherType) -> Self {
        TypeDescriptor::Either(either)
    }
}

/// One property of an object descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    name: String,
    ty: TypeDescriptor,
    required: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>, required: bool) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Object descriptor: properties in declaration order
///
/// Declaration order is the order properties are written on encode.
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: Option<Arc<str>>,
    properties: Arc<[Property]>,
}

impl ObjectType {
    /// Start building a named object descriptor
    pub fn builder(name: impl Into<String>) -> ObjectBuilder {
        ObjectBuilder {
            name: Some(name.into()),
            properties: Vec::new(),
        }
    }

    /// Start building an anonymous object descriptor
    pub fn anonymous() -> ObjectBuilder {
        ObjectBuilder {
            name: None,
            properties: Vec::new(),
        }
    }

    /// Create an object descriptor from a property list
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTypeDescriptor` if two properties share a name.
    pub fn new(name: Option<String>, properties: Vec<Property>) -> Result<Self> {
        let mut seen = HashSet::new();
        for property in &properties {
            if !seen.insert(property.name.as_str()) {
                return Err(Error::InvalidTypeDescriptor(format!(
                    "duplicate property '{}' in {}",
                    property.name,
                    name.as_deref().unwrap_or("object")
                )));
            }
        }

        Ok(Self {
            name: name.map(Arc::from),
            properties: properties.into(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.properties, &other.properties) || self.properties == other.properties
    }
}

impl Eq for ObjectType {}

impl Hash for ObjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.properties.hash(state);
    }
}

/// Fluent construction of an [`ObjectType`]
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    name: Option<String>,
    properties: Vec<Property>,
}

impl ObjectBuilder {
    /// Add a property that must be present
    pub fn required(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.properties.push(Property::new(name, ty, true));
        self
    }

    /// Add a property that may be absent
    pub fn optional(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.properties.push(Property::new(name, ty, false));
        self
    }

    /// Finish the object as a descriptor
    pub fn build(self) -> Result<TypeDescriptor> {
        ObjectType::new(self.name, self.properties).map(TypeDescriptor::Object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    element: Arc<TypeDescriptor>,
}

impl ArrayType {
    pub fn new(element: impl Into<TypeDescriptor>) -> Self {
        Self {
            element: Arc::new(element.into()),
        }
    }

    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    value: Arc<TypeDescriptor>,
}

impl MapType {
    pub fn new(value: impl Into<TypeDescriptor>) -> Self {
        Self {
            value: Arc::new(value.into()),
        }
    }

    pub fn value(&self) -> &TypeDescriptor {
        &self.value
    }
}

/// Binary union of two descriptors
///
/// Either nodes may nest on both sides to any depth. `depth` counts the
/// directly nested Either levels, with a lone Either at depth 1.
#[derive(Debug, Clone)]
pub struct EitherType {
    left: Arc<TypeDescriptor>,
    right: Arc<TypeDescriptor>,
    fingerprint: u64,
    depth: usize,
}

impl EitherType {
    pub fn new(left: impl Into<TypeDescriptor>, right: impl Into<TypeDescriptor>) -> Self {
        let left = left.into();
        let right = right.into();

        let mut hasher = DefaultHasher::new();
        left.hash(&mut hasher);
        right.hash(&mut hasher);

        Self {
            depth: 1 + left.either_depth().max(right.either_depth()),
            fingerprint: hasher.finish(),
            left: Arc::new(left),
            right: Arc::new(right),
        }
    }

    pub fn left(&self) -> &TypeDescriptor {
        &self.left
    }

    pub fn right(&self) -> &TypeDescriptor {
        &self.right
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Structural hash computed at construction
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl PartialEq for EitherType {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.left, &other.left) && Arc::ptr_eq(&self.right, &other.right) {
            return true;
        }
        self.fingerprint == other.fingerprint
            && self.depth == other.depth
            && self.left == other.left
            && self.right == other.right
    }
}

impl Eq for EitherType {}

impl Hash for EitherType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}
