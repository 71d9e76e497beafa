//! Merging config files into an accumulated document.
//!
//! Two merge layers exist:
//! - **Default-aware** (legacy single-file mode): a loaded field is copied
//!   only if it differs from the default. A file therefore cannot restore a
//!   field to its default value.
//! - **Strategy-aware** (inheritance mode): every key of a file is applied
//!   through its [`MergeStrategy`], in document order.
//!
//! Both work on the serialized value tree of the document and are driven by
//! the field descriptors of its type.

use super::fields::{FieldDescriptor, document_value};
use super::strategy::{MergeOperation, MergeStrategy};
use super::value::{FieldKind, FieldValue, assign, lookup};
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Copy every leaf of `loaded` that differs from `defaults` into `result`.
pub fn merge_with_defaults<T>(
    result: &mut T,
    loaded: &T,
    defaults: &T,
    fields: &[FieldDescriptor],
) -> ConfigResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = document_value(result)?;
    let loaded = document_value(loaded)?;
    let defaults = document_value(defaults)?;

    for field in fields.iter().filter(|f| !f.is_record) {
        let new = FieldValue::from_json_or_zero(field.kind, lookup(&loaded, &field.dotted_path));
        let default =
            FieldValue::from_json_or_zero(field.kind, lookup(&defaults, &field.dotted_path));

        if new != default
            && let Some(node) = lookup(&loaded, &field.dotted_path)
        {
            assign(&mut merged, &field.dotted_path, node.clone());
        }
    }

    *result = serde_json::from_value(merged)?;
    Ok(())
}

/// Apply one file's merge operations to an accumulated value tree.
///
/// Operations on unknown fields or with mistyped values are skipped and
/// returned; the remaining operations still apply.
pub fn apply_operations(
    document: &mut Value,
    operations: &[MergeOperation],
    fields: &[FieldDescriptor],
    source: &Path,
) -> Vec<ConfigError> {
    let index: HashMap<&str, &FieldDescriptor> = fields
        .iter()
        .filter(|f| !f.is_record)
        .map(|f| (f.dotted_path.as_str(), f))
        .collect();
    let mut problems = Vec::new();

    for op in operations {
        let Some(field) = index.get(op.key.as_str()) else {
            if is_record_path(fields, &op.key) {
                if !op.value.is_null() {
                    warn!(key = %op.key, file = %source.display(), "Expected a mapping");
                    problems.push(ConfigError::type_mismatch(&op.key, FieldKind::Record, source));
                } else if op.strategy != MergeStrategy::DefaultIfUnset {
                    // `verification: ~` clears an optional record
                    assign(document, &op.key, Value::Null);
                }
                continue;
            }
            warn!(key = %op.key, file = %source.display(), "Unknown config field");
            problems.push(ConfigError::unknown_field(&op.key, source));
            continue;
        };

        if let Err(err) = apply_operation(document, op, field, source) {
            warn!(key = %op.key, file = %source.display(), "{}", err);
            problems.push(err);
        }
    }

    problems
}

fn apply_operation(
    document: &mut Value,
    op: &MergeOperation,
    field: &FieldDescriptor,
    source: &Path,
) -> ConfigResult<()> {
    if op.value.is_null() {
        if !field.is_pointer {
            return Err(ConfigError::type_mismatch(&op.key, field.kind, source));
        }
        if op.strategy != MergeStrategy::DefaultIfUnset {
            assign(document, &op.key, Value::Null);
        }
        return Ok(());
    }

    let incoming = FieldValue::from_json(field.kind, &op.value)
        .ok_or_else(|| ConfigError::type_mismatch(&op.key, field.kind, source))?;
    let current = FieldValue::from_json_or_zero(field.kind, lookup(document, &op.key))
        .ok_or_else(|| ConfigError::type_mismatch(&op.key, field.kind, source))?;

    match op.strategy.apply(&current, incoming) {
        Some(value) => {
            debug!(key = %op.key, strategy = %op.strategy, "Applied merge operation");
            assign(document, &op.key, value.to_json());
        }
        None => {
            debug!(key = %op.key, "Kept inherited value (already set)");
        }
    }
    Ok(())
}

fn is_record_path(fields: &[FieldDescriptor], key: &str) -> bool {
    fields.iter().any(|f| {
        f.dotted_path
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Turn a merged value tree back into a typed document.
pub fn into_document<T: DeserializeOwned>(document: Value) -> ConfigResult<T> {
    Ok(serde_json::from_value(document)?)
}
