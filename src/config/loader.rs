//! Configuration loader.
//!
//! Finds config files on the search path and resolves them into one
//! [`Config`]:
//! 1. **Defaults** - `Config::default()`
//! 2. **Files** - search path entries, lowest priority first, each expanded
//!    into its inheritance chain (or decoded whole in legacy mode)
//! 3. **Environment** - `BKPDIR_<FIELD>` variables
//!
//! Loading never fails. Chain errors fall back to defaults; per-file and
//! per-key problems are logged, kept, and skipped.

use super::cache::FieldCache;
use super::chain::InheritanceChain;
use super::fields::{FieldDescriptor, document_value};
use super::merge::{apply_operations, into_document, merge_with_defaults};
use super::source::env_var_name;
use super::strategy::{MergeOperation, collect_operations};
use super::types::Config;
use super::value::{FieldValue, assign};
use crate::error::{ConfigError, ConfigResult};
use crate::paths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding a colon-separated search path.
pub const CONFIG_ENV_VAR: &str = "BKPDIR_CONFIG";

/// Search path used when `BKPDIR_CONFIG` is not set, highest priority first.
pub const DEFAULT_SEARCH_PATHS: [&str; 2] = ["./.bkpdir.yml", "~/.bkpdir.yml"];

/// How config files are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Follow `inherit` chains and apply merge strategy prefixes.
    #[default]
    Inheritance,
    /// Decode each file whole and copy fields that differ from the defaults.
    Legacy,
}

impl std::fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveMode::Inheritance => write!(f, "inheritance"),
            ResolveMode::Legacy => write!(f, "legacy"),
        }
    }
}

/// Candidate config files, highest priority first.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub search: Vec<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover the search path from `BKPDIR_CONFIG` or the defaults.
    pub fn discover() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let value = std::env::var(CONFIG_ENV_VAR).ok();
        Self::from_env_value(value.as_deref(), &cwd)
    }

    /// Build the search path from an optional `BKPDIR_CONFIG` value.
    ///
    /// Entries are tilde-expanded and made absolute against `cwd`.
    pub fn from_env_value(value: Option<&str>, cwd: &Path) -> Self {
        let entries: Vec<&str> = match value {
            Some(value) if !value.trim().is_empty() => {
                value.split(':').filter(|s| !s.is_empty()).collect()
            }
            _ => DEFAULT_SEARCH_PATHS.to_vec(),
        };

        let search = entries
            .into_iter()
            .map(|entry| paths::absolutize(&paths::expand_tilde(entry), cwd))
            .collect();

        Self { search }
    }

    /// Search exactly these files.
    pub fn with_files(files: Vec<PathBuf>) -> Self {
        Self { search: files }
    }

    /// Search path entries that exist, highest priority first.
    pub fn existing(&self) -> Vec<PathBuf> {
        self.search
            .iter()
            .filter(|path| paths::validate(path).is_ok())
            .cloned()
            .collect()
    }
}

/// Resolved configuration plus everything needed to query and explain it.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search path used for this resolution.
    pub paths: ConfigPaths,
    mode: ResolveMode,
    config: Config,
    /// Highest-priority config file found, if any.
    config_path: Option<PathBuf>,
    /// Files applied, in order.
    applied: Vec<PathBuf>,
    /// Field environment variables seen at load time.
    env: HashMap<String, String>,
    problems: Vec<ConfigError>,
    pub(crate) cache: FieldCache,
}

impl ConfigLoader {
    /// Resolve configuration from the discovered search path.
    pub fn load() -> Self {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Resolve configuration from an explicit search path.
    pub fn load_with_paths(paths: ConfigPaths) -> Self {
        Self::load_with_mode(paths, ResolveMode::default())
    }

    /// Resolve configuration with an explicit mode.
    pub fn load_with_mode(paths: ConfigPaths, mode: ResolveMode) -> Self {
        Self::load_with_env(paths, mode, |name| std::env::var(name).ok())
    }

    /// Resolve configuration reading field overrides through `env_lookup`.
    pub fn load_with_env<F>(paths: ConfigPaths, mode: ResolveMode, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache = FieldCache::new();
        let fields = cache.metadata::<Config>();
        let config_path = paths.existing().into_iter().next();
        let mut problems = Vec::new();

        let resolved = match mode {
            ResolveMode::Inheritance => resolve_inheritance(&paths, &fields, &mut problems),
            ResolveMode::Legacy => resolve_legacy(&paths, &fields, &mut problems),
        };
        let (mut config, applied) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!("{}; falling back to default configuration", err);
                problems.push(err);
                (Config::default(), Vec::new())
            }
        };

        let env = capture_env(&fields, env_lookup);
        if !env.is_empty()
            && let Err(err) = apply_env_overrides(&mut config, &fields, &env)
        {
            warn!("Ignoring environment overrides: {}", err);
            problems.push(err);
        }

        info!(
            mode = %mode,
            files = applied.len(),
            problems = problems.len(),
            "Configuration resolved"
        );

        Self {
            paths,
            mode,
            config,
            config_path,
            applied,
            env,
            problems,
            cache,
        }
    }

    /// Get the resolved configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the highest-priority config file that was found.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Config files applied, in application order.
    pub fn applied_files(&self) -> &[PathBuf] {
        &self.applied
    }

    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Problems recovered from during resolution.
    pub fn problems(&self) -> &[ConfigError] {
        &self.problems
    }

    /// Value of a field environment variable seen at load time.
    pub fn env_value(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}

/// Build chains for every existing search path entry and fold them in order.
fn resolve_inheritance(
    paths: &ConfigPaths,
    fields: &[FieldDescriptor],
    problems: &mut Vec<ConfigError>,
) -> ConfigResult<(Config, Vec<PathBuf>)> {
    let mut files: Vec<PathBuf> = Vec::new();
    for candidate in paths.existing().iter().rev() {
        let chain = InheritanceChain::build(candidate)?;
        for file in chain.into_files() {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    let mut document = document_value(&Config::default())?;
    for file in &files {
        match load_operations(file) {
            Ok(operations) => {
                debug!(file = %file.display(), operations = operations.len(), "Applying config file");
                problems.extend(apply_operations(&mut document, &operations, fields, file));
            }
            Err(err) => {
                warn!("{}; skipping file", err);
                problems.push(err);
            }
        }
    }

    Ok((into_document(document)?, files))
}

/// Decode every existing search path entry whole and merge it over the defaults.
fn resolve_legacy(
    paths: &ConfigPaths,
    fields: &[FieldDescriptor],
    problems: &mut Vec<ConfigError>,
) -> ConfigResult<(Config, Vec<PathBuf>)> {
    let defaults = Config::default();
    let mut config = Config::default();
    let mut applied = Vec::new();

    for candidate in paths.search.iter().rev() {
        if let Err(err) = paths::validate(candidate) {
            debug!("{}; skipping", err);
            continue;
        }

        match load_file(candidate) {
            Ok(loaded) => {
                merge_with_defaults(&mut config, &loaded, &defaults, fields)?;
                applied.push(candidate.clone());
            }
            Err(err) => {
                warn!("{}; skipping file", err);
                problems.push(err);
            }
        }
    }

    Ok((config, applied))
}

/// Decode a whole config file.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::decode(path, e))?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::decode(path, e))
}

/// Read a config file as merge operations.
pub fn load_operations(path: &Path) -> ConfigResult<Vec<MergeOperation>> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::decode(path, e))?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::decode(path, e))?;

    match value {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Mapping(mapping) => {
            collect_operations(&mapping).map_err(|e| ConfigError::decode(path, e))
        }
        _ => Err(ConfigError::decode(path, "expected a mapping at the top level")),
    }
}

fn capture_env<F>(fields: &[FieldDescriptor], env_lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    fields
        .iter()
        .filter(|f| !f.is_record)
        .filter_map(|f| {
            let name = env_var_name(&f.dotted_path);
            env_lookup(&name).map(|value| (name, value))
        })
        .collect()
}

/// Apply `BKPDIR_<FIELD>` overrides. Unparsable values are logged and skipped.
fn apply_env_overrides(
    config: &mut Config,
    fields: &[FieldDescriptor],
    env: &HashMap<String, String>,
) -> ConfigResult<()> {
    let mut document = document_value(config)?;

    for field in fields.iter().filter(|f| !f.is_record) {
        let name = env_var_name(&field.dotted_path);
        let Some(text) = env.get(&name) else {
            continue;
        };
        match FieldValue::parse_text(field.kind, text) {
            Some(value) => {
                debug!(field = %field.dotted_path, var = %name, "Applied environment override");
                assign(&mut document, &field.dotted_path, value.to_json());
            }
            None => warn!(var = %name, "Cannot parse value as {}", field.kind),
        }
    }

    *config = into_document(document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_search_paths() {
        let paths = ConfigPaths::from_env_value(None, Path::new("/work"));
        assert_eq!(paths.search.len(), 2);
        assert_eq!(paths.search[0], PathBuf::from("/work/.bkpdir.yml"));
        assert!(paths.search[1].ends_with(".bkpdir.yml"));
    }

    #[test]
    fn test_env_search_paths() {
        let paths = ConfigPaths::from_env_value(Some("a.yml::/etc/b.yml"), Path::new("/work"));
        assert_eq!(
            paths.search,
            vec![PathBuf::from("/work/a.yml"), PathBuf::from("/etc/b.yml")]
        );
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_files(vec![temp.path().join("missing.yml")]);

        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, no_env);
        assert_eq!(loader.config(), &Config::default());
        assert!(loader.config_path().is_none());
        assert!(loader.applied_files().is_empty());
        assert!(loader.problems().is_empty());
    }

    #[test]
    fn test_higher_priority_file_wins() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.yml");
        let user = temp.path().join("user.yml");
        std::fs::write(&project, "max_backups: 10\n").unwrap();
        std::fs::write(&user, "max_backups: 20\nmax_archives: 600\n").unwrap();

        let paths = ConfigPaths::with_files(vec![project.clone(), user.clone()]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, no_env);

        assert_eq!(loader.config().max_backups, 10);
        assert_eq!(loader.config().max_archives, 600);
        assert_eq!(loader.config_path(), Some(project.as_path()));
        assert_eq!(loader.applied_files(), &[user, project]);
    }

    #[test]
    fn test_shared_parent_applied_once() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("base.yml");
        let project = temp.path().join("project.yml");
        let user = temp.path().join("user.yml");
        std::fs::write(&base, "+exclude_patterns: [\"*.log\"]\n").unwrap();
        std::fs::write(&project, "inherit: [base.yml]\n").unwrap();
        std::fs::write(&user, "inherit: [base.yml]\n").unwrap();

        let paths = ConfigPaths::with_files(vec![project, user]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, no_env);
        assert_eq!(
            loader.config().exclude_patterns,
            vec![".git/", "vendor/", "*.log"]
        );
        assert_eq!(loader.applied_files().len(), 3);
    }

    #[test]
    fn test_cycle_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.yml");
        std::fs::write(&a, "inherit: [b.yml]\nmax_backups: 3\n").unwrap();
        std::fs::write(temp.path().join("b.yml"), "inherit: [a.yml]\n").unwrap();

        let paths = ConfigPaths::with_files(vec![a]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, no_env);
        assert_eq!(loader.config(), &Config::default());
        assert_eq!(loader.problems().len(), 1);
        assert_eq!(
            loader.problems()[0].code(),
            crate::error::ErrorCode::CircularDependency
        );
    }

    #[test]
    fn test_decode_error_skips_file() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.yml");
        let bad = temp.path().join("bad.yml");
        std::fs::write(&good, "max_backups: 5\n").unwrap();
        std::fs::write(&bad, "- just\n- a list\n").unwrap();

        let paths = ConfigPaths::with_files(vec![bad, good]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, no_env);
        assert_eq!(loader.config().max_backups, 5);
        assert_eq!(loader.problems().len(), 1);
        assert_eq!(
            loader.problems()[0].code(),
            crate::error::ErrorCode::DecodeError
        );
    }

    #[test]
    fn test_legacy_mode() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.yml");
        let user = temp.path().join("user.yml");
        let broken = temp.path().join("broken.yml");
        std::fs::write(&project, "max_backups: 10\n").unwrap();
        std::fs::write(&user, "max_backups: 20\nuse_current_dir_name: false\n").unwrap();
        std::fs::write(&broken, "max_backups: [oops\n").unwrap();

        let paths = ConfigPaths::with_files(vec![
            project,
            temp.path().join("missing.yml"),
            broken,
            user,
        ]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Legacy, no_env);

        assert_eq!(loader.mode(), ResolveMode::Legacy);
        assert_eq!(loader.config().max_backups, 10);
        assert!(!loader.config().use_current_dir_name);
        assert_eq!(loader.applied_files().len(), 2);
        assert_eq!(loader.problems().len(), 1);
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("c.yml");
        std::fs::write(&file, "max_backups: 10\n").unwrap();

        let env = |name: &str| match name {
            "BKPDIR_MAX_BACKUPS" => Some("12".to_string()),
            "BKPDIR_EXCLUDE_PATTERNS" => Some("a/,b/".to_string()),
            "BKPDIR_VERIFICATION_VERIFY_ON_CREATE" => Some("true".to_string()),
            "BKPDIR_MAX_ARCHIVES" => Some("many".to_string()),
            _ => None,
        };
        let paths = ConfigPaths::with_files(vec![file]);
        let loader = ConfigLoader::load_with_env(paths, ResolveMode::Inheritance, env);

        let config = loader.config();
        assert_eq!(config.max_backups, 12);
        assert_eq!(config.exclude_patterns, vec!["a/", "b/"]);
        assert!(config.verification.as_ref().unwrap().verify_on_create);
        assert_eq!(config.max_archives, 0);
        assert_eq!(loader.env_value("BKPDIR_MAX_BACKUPS").as_deref(), Some("12"));
    }

    #[test]
    fn test_load_operations_empty_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("empty.yml");
        std::fs::write(&file, "").unwrap();
        assert!(load_operations(&file).unwrap().is_empty());
        assert_eq!(load_file(&file).unwrap(), Config::default());
    }
}
