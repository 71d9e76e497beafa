//! Merge strategy prefixes for inheritable config files.
//!
//! A key's first character selects how its value combines with the value
//! inherited from parent files:
//!
//! | Key      | Strategy          |
//! |----------|-------------------|
//! | `key`    | override          |
//! | `+key`   | merge (append)    |
//! | `^key`   | prepend           |
//! | `!key`   | replace           |
//! | `=key`   | default-if-unset  |

use super::value::FieldValue;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// How an incoming value combines with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    Override,
    Merge,
    Prepend,
    Replace,
    DefaultIfUnset,
}

impl MergeStrategy {
    /// Strategy selected by a key prefix character.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            '+' => Some(MergeStrategy::Merge),
            '^' => Some(MergeStrategy::Prepend),
            '!' => Some(MergeStrategy::Replace),
            '=' => Some(MergeStrategy::DefaultIfUnset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Override => "override",
            MergeStrategy::Merge => "merge",
            MergeStrategy::Prepend => "prepend",
            MergeStrategy::Replace => "replace",
            MergeStrategy::DefaultIfUnset => "default_if_unset",
        }
    }

    /// Combine the current value with an incoming one.
    ///
    /// Returns `None` when the current value is kept. List-only strategies
    /// behave as override on scalars.
    pub fn apply(&self, current: &FieldValue, incoming: FieldValue) -> Option<FieldValue> {
        match (self, current, incoming) {
            (MergeStrategy::Merge, FieldValue::StringList(current), FieldValue::StringList(new)) => {
                let mut merged = current.clone();
                merged.extend(new);
                Some(FieldValue::StringList(merged))
            }
            (MergeStrategy::Prepend, FieldValue::StringList(current), FieldValue::StringList(new)) => {
                let mut merged = new;
                merged.extend(current.iter().cloned());
                Some(FieldValue::StringList(merged))
            }
            (MergeStrategy::DefaultIfUnset, current, incoming) => {
                current.is_zero().then_some(incoming)
            }
            (_, _, incoming) => Some(incoming),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a raw key into its strategy and clean key.
pub fn extract_strategy(raw_key: &str) -> (MergeStrategy, &str) {
    let mut chars = raw_key.chars();
    match chars.next().and_then(MergeStrategy::from_prefix) {
        Some(strategy) => (strategy, chars.as_str()),
        None => (MergeStrategy::Override, raw_key),
    }
}

/// One key of a config file, classified.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOperation {
    pub strategy: MergeStrategy,
    /// Dotted path of the target field, prefixes stripped.
    pub key: String,
    pub value: Value,
}

/// Classify every key of a decoded config file, in document order.
///
/// Nested mappings are flattened into dotted keys. A prefix on a mapping key
/// is the default strategy for the keys inside it; a prefix on an inner key
/// takes precedence.
pub fn collect_operations(document: &serde_yaml::Mapping) -> Result<Vec<MergeOperation>, String> {
    let mut operations = Vec::new();
    collect_into(document, None, None, &mut operations)?;
    Ok(operations)
}

fn collect_into(
    mapping: &serde_yaml::Mapping,
    prefix: Option<&str>,
    inherited: Option<MergeStrategy>,
    out: &mut Vec<MergeOperation>,
) -> Result<(), String> {
    for (raw_key, raw_value) in mapping {
        let raw_key = raw_key
            .as_str()
            .ok_or_else(|| format!("non-string key {:?}", raw_key))?;
        let (strategy, clean) = extract_strategy(raw_key);
        let strategy = match (strategy, inherited) {
            (MergeStrategy::Override, Some(parent)) => parent,
            (own, _) => own,
        };
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, clean),
            None => clean.to_string(),
        };

        if let serde_yaml::Value::Mapping(nested) = raw_value {
            collect_into(nested, Some(&key), Some(strategy), out)?;
            continue;
        }

        let value = serde_json::to_value(raw_value).map_err(|e| format!("{}: {}", key, e))?;
        out.push(MergeOperation {
            strategy,
            key,
            value,
        });
    }
    Ok(())
}
