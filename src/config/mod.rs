//! Hierarchical configuration resolution.
//!
//! Resolves one [`Config`] from defaults, YAML config files and environment
//! variables:
//! 1. **Defaults** - `Config::default()`
//! 2. **Files** - `./.bkpdir.yml`, then `~/.bkpdir.yml` (or `BKPDIR_CONFIG`)
//! 3. **Environment** - `BKPDIR_<FIELD>` overrides
//!
//! ## Inheritance
//! A file may list parent files under `inherit`. Parents apply before the
//! file itself; cycles are rejected.
//!
//! ## Merge Strategy
//! Key prefixes choose how a value combines with the inherited one:
//! `key` override, `+key` append, `^key` prepend, `!key` replace,
//! `=key` set only if unset.
//!
//! ## Environment Variables
//! - `BKPDIR_CONFIG` - Colon-separated list of config files to search
//! - `BKPDIR_<FIELD>` - Override one field, e.g. `BKPDIR_MAX_BACKUPS`

mod cache;
mod chain;
mod fields;
mod loader;
mod merge;
mod query;
mod schema;
mod source;
mod strategy;
mod types;
mod value;

pub use cache::FieldCache;
pub use chain::{InheritanceChain, read_inherit_list};
pub use fields::{
    FieldCategory, FieldDescriptor, describe_path, discover_fields, discover_metadata,
    document_value, populate_values,
};
pub use loader::{
    CONFIG_ENV_VAR, ConfigLoader, ConfigPaths, DEFAULT_SEARCH_PATHS, ResolveMode, load_file,
    load_operations,
};
pub use merge::{apply_operations, into_document, merge_with_defaults};
pub use query::{FieldFilter, glob_to_regex};
pub use schema::{FieldShape, RecordShape, Reflect, TypeShape, structural_hash, structural_hash_of};
pub use source::{ENV_PREFIX, ResolvedValue, ValueSource, attribute_all, attribute_one, env_var_name};
pub use strategy::{MergeOperation, MergeStrategy, collect_operations, extract_strategy};
pub use types::{Config, VerificationConfig};
pub use value::{FieldKind, FieldValue};
