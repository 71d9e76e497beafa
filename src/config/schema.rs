//! Declared type shapes for configuration documents.
//!
//! A document type describes its own shape once through [`Reflect`]; field
//! discovery walks that shape instead of inspecting types at runtime, and the
//! field cache fingerprints it with [`structural_hash`].

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Shape of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    String,
    Bool,
    Int,
    List(Box<TypeShape>),
    Optional(Box<TypeShape>),
    Record(RecordShape),
}

/// A named record and its fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: Vec<FieldShape>,
}

/// One declared field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    /// Declared (source) name of the field.
    pub name: &'static str,
    /// Serialized key, as written in config files.
    pub tag: &'static str,
    pub shape: TypeShape,
}

impl FieldShape {
    /// A field serialized under its declared name.
    pub fn new(name: &'static str, shape: TypeShape) -> Self {
        Self {
            name,
            tag: name,
            shape,
        }
    }

    /// A field serialized under a different key.
    pub fn renamed(name: &'static str, tag: &'static str, shape: TypeShape) -> Self {
        Self { name, tag, shape }
    }
}

impl TypeShape {
    pub fn list(element: TypeShape) -> Self {
        TypeShape::List(Box::new(element))
    }

    pub fn optional(inner: TypeShape) -> Self {
        TypeShape::Optional(Box::new(inner))
    }

    pub fn record(name: &'static str, fields: Vec<FieldShape>) -> Self {
        TypeShape::Record(RecordShape { name, fields })
    }

    /// Type name as it enters the structural hash.
    pub fn type_name(&self) -> &str {
        match self {
            TypeShape::String => "String",
            TypeShape::Bool => "bool",
            TypeShape::Int => "i64",
            TypeShape::List(_) => "Vec",
            TypeShape::Optional(_) => "Option",
            TypeShape::Record(record) => record.name,
        }
    }

    /// Kind name as it enters the structural hash.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeShape::String => "string",
            TypeShape::Bool => "bool",
            TypeShape::Int => "int",
            TypeShape::List(_) => "list",
            TypeShape::Optional(_) => "optional",
            TypeShape::Record(_) => "record",
        }
    }

    /// Strip one level of `Optional`, reporting whether there was one.
    pub fn unwrap_optional(&self) -> (&TypeShape, bool) {
        match self {
            TypeShape::Optional(inner) => (inner, true),
            other => (other, false),
        }
    }
}

/// A document type that declares its own shape.
///
/// The shape must be a [`TypeShape::Record`] whose field tags match the
/// type's serde serialization. Fields may be scalars, lists of strings or
/// records, each optionally wrapped in one `Optional`; discovery skips
/// fields of any other shape.
pub trait Reflect: Serialize {
    fn shape() -> TypeShape;
}

/// SHA-256 fingerprint of a type shape, hex encoded.
pub fn structural_hash(shape: &TypeShape) -> String {
    let mut hasher = Sha256::new();
    hash_shape(shape, &mut hasher);
    hex::encode(hasher.finalize())
}

/// Structural hash of a [`Reflect`] type.
pub fn structural_hash_of<T: Reflect>() -> String {
    structural_hash(&T::shape())
}

fn hash_shape(shape: &TypeShape, hasher: &mut Sha256) {
    hasher.update(shape.type_name().as_bytes());
    hasher.update([0]);
    hasher.update(shape.kind_name().as_bytes());
    hasher.update([0]);

    match shape {
        TypeShape::Record(record) => {
            for field in &record.fields {
                hasher.update(field.name.as_bytes());
                hasher.update([0]);
                hasher.update(field.tag.as_bytes());
                hasher.update([0]);
                hash_shape(&field.shape, hasher);
            }
            hasher.update(b"}");
        }
        TypeShape::List(element) | TypeShape::Optional(element) => hash_shape(element, hasher),
        TypeShape::String | TypeShape::Bool | TypeShape::Int => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(extra: bool) -> TypeShape {
        let mut fields = vec![
            FieldShape::new("name", TypeShape::String),
            FieldShape::new("tags", TypeShape::list(TypeShape::String)),
        ];
        if extra {
            fields.push(FieldShape::new("enabled", TypeShape::Bool));
        }
        TypeShape::record("Sample", fields)
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(structural_hash(&sample(false)), structural_hash(&sample(false)));
        assert_eq!(structural_hash(&sample(false)).len(), 64);
    }

    #[test]
    fn test_hash_changes_with_fields() {
        assert_ne!(structural_hash(&sample(false)), structural_hash(&sample(true)));
    }

    #[test]
    fn test_hash_changes_with_tag_and_element_type() {
        let a = TypeShape::record("R", vec![FieldShape::new("a", TypeShape::String)]);
        let b = TypeShape::record("R", vec![FieldShape::renamed("a", "b", TypeShape::String)]);
        let c = TypeShape::record(
            "R",
            vec![FieldShape::new("a", TypeShape::optional(TypeShape::String))],
        );
        assert_ne!(structural_hash(&a), structural_hash(&b));
        assert_ne!(structural_hash(&a), structural_hash(&c));
    }

    #[test]
    fn test_unwrap_optional() {
        let shape = TypeShape::optional(TypeShape::Int);
        assert_eq!(shape.unwrap_optional(), (&TypeShape::Int, true));
        assert_eq!(TypeShape::Bool.unwrap_optional(), (&TypeShape::Bool, false));
    }
}
