//! Typed leaf values and dotted-path access into document value trees.

use super::schema::TypeShape;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Bool,
    Int,
    StringList,
    Record,
}

impl FieldKind {
    /// Kind of a declared shape, looking through one `Optional`.
    ///
    /// `None` for shapes a field cannot have: lists of anything but strings
    /// and nested optionals.
    pub fn from_shape(shape: &TypeShape) -> Option<Self> {
        match shape.unwrap_optional().0 {
            TypeShape::String => Some(FieldKind::String),
            TypeShape::Bool => Some(FieldKind::Bool),
            TypeShape::Int => Some(FieldKind::Int),
            TypeShape::List(element) => match element.as_ref() {
                TypeShape::String => Some(FieldKind::StringList),
                _ => None,
            },
            TypeShape::Record(_) => Some(FieldKind::Record),
            TypeShape::Optional(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::StringList => "string_list",
            FieldKind::Record => "record",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one leaf field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Int(i64),
    StringList(Vec<String>),
}

impl FieldValue {
    /// Zero value of a leaf kind. Records have none.
    pub fn zero(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::String => Some(FieldValue::String(String::new())),
            FieldKind::Bool => Some(FieldValue::Bool(false)),
            FieldKind::Int => Some(FieldValue::Int(0)),
            FieldKind::StringList => Some(FieldValue::StringList(Vec::new())),
            FieldKind::Record => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::StringList(_) => FieldKind::StringList,
        }
    }

    /// Empty string, false, 0 or empty list.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Bool(b) => !b,
            FieldValue::Int(i) => *i == 0,
            FieldValue::StringList(items) => items.is_empty(),
        }
    }

    /// Read a value of the given kind out of a value tree node.
    ///
    /// Scalars are accepted where a string is expected (YAML `1.0` for a
    /// string field reads as `"1.0"`). `null` is not a value; callers decide
    /// whether it means the zero value.
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (FieldKind::String, Value::String(s)) => Some(FieldValue::String(s.clone())),
            (FieldKind::String, Value::Number(n)) => Some(FieldValue::String(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Some(FieldValue::String(b.to_string())),
            (FieldKind::Bool, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
            (FieldKind::Int, Value::Number(n)) => n.as_i64().map(FieldValue::Int),
            (FieldKind::StringList, Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::StringList),
            _ => None,
        }
    }

    /// Read a node, treating a missing or `null` node as the zero value.
    pub fn from_json_or_zero(kind: FieldKind, value: Option<&Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => Self::zero(kind),
            Some(v) => Self::from_json(kind, v),
        }
    }

    /// Parse a value from plain text, e.g. an environment variable.
    ///
    /// Lists are comma-separated; empty items are dropped.
    pub fn parse_text(kind: FieldKind, text: &str) -> Option<Self> {
        match kind {
            FieldKind::String => Some(FieldValue::String(text.to_string())),
            FieldKind::Bool => match text.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(FieldValue::Bool(true)),
                "false" | "0" | "no" | "off" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            FieldKind::Int => text.trim().parse().ok().map(FieldValue::Int),
            FieldKind::StringList => Some(FieldValue::StringList(
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            FieldKind::Record => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::StringList(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Find the node at a dotted path.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Set the node at a dotted path, creating intermediate objects as needed.
///
/// A `null` or non-object intermediate (an absent optional record) is
/// replaced by an empty object first.
pub fn assign(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        node = map.entry(segment.to_string()).or_insert(Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_shape() {
        assert_eq!(
            FieldKind::from_shape(&TypeShape::optional(TypeShape::Int)),
            Some(FieldKind::Int)
        );
        assert_eq!(
            FieldKind::from_shape(&TypeShape::list(TypeShape::String)),
            Some(FieldKind::StringList)
        );
        assert_eq!(FieldKind::from_shape(&TypeShape::list(TypeShape::Int)), None);
        assert_eq!(
            FieldKind::from_shape(&TypeShape::optional(TypeShape::optional(TypeShape::Bool))),
            None
        );
    }

    #[test]
    fn test_zero_values() {
        for kind in [
            FieldKind::String,
            FieldKind::Bool,
            FieldKind::Int,
            FieldKind::StringList,
        ] {
            let zero = FieldValue::zero(kind).unwrap();
            assert!(zero.is_zero());
            assert_eq!(zero.kind(), kind);
        }
        assert!(FieldValue::zero(FieldKind::Record).is_none());
    }

    #[test]
    fn test_from_json_checks_kind() {
        assert_eq!(
            FieldValue::from_json(FieldKind::Int, &json!(7)),
            Some(FieldValue::Int(7))
        );
        assert_eq!(FieldValue::from_json(FieldKind::Int, &json!("7")), None);
        assert_eq!(FieldValue::from_json(FieldKind::Bool, &json!(1)), None);
        assert_eq!(
            FieldValue::from_json(FieldKind::String, &json!(1.5)),
            Some(FieldValue::String("1.5".into()))
        );
        assert_eq!(
            FieldValue::from_json(FieldKind::StringList, &json!(["a", "b"])),
            Some(FieldValue::StringList(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            FieldValue::from_json(FieldKind::StringList, &json!(["a", {"b": 1}])),
            None
        );
    }

    #[test]
    fn test_null_reads_as_zero() {
        assert_eq!(
            FieldValue::from_json_or_zero(FieldKind::String, Some(&Value::Null)),
            Some(FieldValue::String(String::new()))
        );
        assert_eq!(
            FieldValue::from_json_or_zero(FieldKind::Bool, None),
            Some(FieldValue::Bool(false))
        );
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            FieldValue::parse_text(FieldKind::Bool, "yes"),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(FieldValue::parse_text(FieldKind::Bool, "maybe"), None);
        assert_eq!(
            FieldValue::parse_text(FieldKind::Int, " 42 "),
            Some(FieldValue::Int(42))
        );
        assert_eq!(
            FieldValue::parse_text(FieldKind::StringList, "*.tmp, ,.git/"),
            Some(FieldValue::StringList(vec!["*.tmp".into(), ".git/".into()]))
        );
    }

    #[test]
    fn test_display() {
        let list = FieldValue::StringList(vec![".git/".into(), "*.tmp".into()]);
        assert_eq!(list.to_string(), "[.git/, *.tmp]");
        assert_eq!(FieldValue::Int(31).to_string(), "31");
    }

    #[test]
    fn test_lookup_and_assign() {
        let mut doc = json!({"a": 1, "verification": null});
        assert_eq!(lookup(&doc, "a"), Some(&json!(1)));
        assert_eq!(lookup(&doc, "verification.verify_on_create"), None);

        assign(&mut doc, "verification.verify_on_create", json!(true));
        assert_eq!(
            lookup(&doc, "verification.verify_on_create"),
            Some(&json!(true))
        );

        assign(&mut doc, "a", json!(2));
        assert_eq!(doc["a"], json!(2));
    }
}
