//! Source attribution for resolved configuration values.

use super::fields::FieldDescriptor;
use heck::ToShoutySnakeCase;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix of per-field environment variables.
pub const ENV_PREFIX: &str = "BKPDIR_";

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Equal to the default.
    Default,
    /// Set by a config file.
    File(PathBuf),
    /// Set by an environment variable.
    Environment,
    /// Set by configuration, file unknown.
    Config,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Default => write!(f, "default"),
            ValueSource::File(path) => write!(f, "{}", path.display()),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::Config => write!(f, "config"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved leaf value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    /// Serialized dotted name.
    pub name: String,
    pub value: String,
    pub source: ValueSource,
}

/// Environment variable that overrides the field at `dotted_path`.
///
/// `verification.verify_on_create` → `BKPDIR_VERIFICATION_VERIFY_ON_CREATE`.
pub fn env_var_name(dotted_path: &str) -> String {
    format!(
        "{}{}",
        ENV_PREFIX,
        dotted_path.replace('.', "_").to_shouty_snake_case()
    )
}

/// Attribute every resolved leaf.
///
/// A leaf equal to its default is `default`; any other leaf is attributed to
/// the active config file, or to the `default` marker when no file was found.
/// Sorted by serialized name.
pub fn attribute_all(
    resolved: &[FieldDescriptor],
    defaults: &[FieldDescriptor],
    active_file: Option<&Path>,
) -> Vec<ResolvedValue> {
    let defaults: HashMap<&str, &FieldDescriptor> = defaults
        .iter()
        .map(|d| (d.dotted_path.as_str(), d))
        .collect();

    let mut values: Vec<ResolvedValue> = resolved
        .iter()
        .filter(|field| !field.is_record)
        .map(|field| {
            let is_default = defaults
                .get(field.dotted_path.as_str())
                .is_some_and(|d| d.value == field.value);
            let source = match (is_default, active_file) {
                (true, _) | (false, None) => ValueSource::Default,
                (false, Some(path)) => ValueSource::File(path.to_path_buf()),
            };
            ResolvedValue {
                name: field.dotted_path.clone(),
                value: field.value_text(),
                source,
            }
        })
        .collect();

    values.sort_by(|a, b| a.name.cmp(&b.name));
    values
}

/// Attribute a single resolved leaf.
///
/// A leaf equal to its default is `default`; otherwise it is `environment`
/// when its environment variable is set, and `config` when not.
pub fn attribute_one<F>(
    resolved: &FieldDescriptor,
    default: &FieldDescriptor,
    env_lookup: F,
) -> ResolvedValue
where
    F: Fn(&str) -> Option<String>,
{
    let source = if resolved.value == default.value {
        ValueSource::Default
    } else if env_lookup(&env_var_name(&resolved.dotted_path)).is_some() {
        ValueSource::Environment
    } else {
        ValueSource::Config
    };

    ResolvedValue {
        name: resolved.dotted_path.clone(),
        value: resolved.value_text(),
        source,
    }
}
