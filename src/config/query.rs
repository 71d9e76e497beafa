//! Field queries over a resolved configuration.
//!
//! This is the surface the CLI and formatters consume: enumerate fields,
//! filter them, fetch one by dotted path, and explain where values came from.

use super::fields::{FieldCategory, FieldDescriptor, describe_path};
use super::loader::ConfigLoader;
use super::source::{ResolvedValue, attribute_all, attribute_one};
use super::types::Config;
use crate::error::ConfigResult;
use regex_lite::Regex;

/// Filter for [`ConfigLoader::find_fields`]. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    /// Case-insensitive substring of the dotted path.
    pub name: Option<String>,
    pub category: Option<FieldCategory>,
    /// Glob over the dotted path (`*` and `?`).
    pub pattern: Option<Regex>,
}

impl FieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into().to_lowercase());
        self
    }

    pub fn with_category(mut self, category: FieldCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Match dotted paths against a glob.
    pub fn with_glob(mut self, glob: &str) -> Result<Self, regex_lite::Error> {
        self.pattern = Some(glob_to_regex(glob)?);
        Ok(self)
    }

    pub fn matches(&self, field: &FieldDescriptor) -> bool {
        if let Some(ref name) = self.name
            && !field.dotted_path.to_lowercase().contains(name.as_str())
        {
            return false;
        }
        if let Some(category) = self.category
            && field.category != category
        {
            return false;
        }
        if let Some(ref pattern) = self.pattern
            && !pattern.is_match(&field.dotted_path)
        {
            return false;
        }
        true
    }
}

/// Compile a glob (`*` = any run, `?` = any one character) into an anchored regex.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex_lite::Error> {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex_lite::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

impl ConfigLoader {
    /// All leaf fields with their resolved values, sorted by declared name.
    pub fn fields(&self) -> ConfigResult<Vec<FieldDescriptor>> {
        self.cache.discover(self.config())
    }

    /// Leaf fields matching `filter`.
    pub fn find_fields(&self, filter: &FieldFilter) -> ConfigResult<Vec<FieldDescriptor>> {
        Ok(self
            .fields()?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect())
    }

    /// One field (leaf or record) by dotted path, with its value for leaves.
    pub fn field(&self, path: &str) -> ConfigResult<Option<FieldDescriptor>> {
        let Some(mut descriptor) = describe_path::<Config>(path) else {
            return Ok(None);
        };
        if !descriptor.is_record {
            let document = super::fields::document_value(self.config())?;
            descriptor.refresh_value(&document);
        }
        Ok(Some(descriptor))
    }

    /// Whether a dotted path names a field.
    pub fn has_field(&self, path: &str) -> bool {
        describe_path::<Config>(path).is_some()
    }

    /// Every resolved leaf with its source, sorted by name.
    pub fn sources(&self) -> ConfigResult<Vec<ResolvedValue>> {
        let resolved = self.fields()?;
        let defaults = self.cache.discover(&Config::default())?;
        Ok(attribute_all(&resolved, &defaults, self.config_path()))
    }

    /// One resolved leaf with its source.
    pub fn source_of(&self, path: &str) -> ConfigResult<Option<ResolvedValue>> {
        let resolved = self.fields()?;
        let defaults = self.cache.discover(&Config::default())?;

        let find = |fields: &[FieldDescriptor]| fields.iter().find(|f| f.dotted_path == path).cloned();
        let (Some(resolved), Some(default)) = (find(&resolved), find(&defaults)) else {
            return Ok(None);
        };

        Ok(Some(attribute_one(&resolved, &default, |name| {
            self.env_value(name)
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{ConfigPaths, ResolveMode};
    use crate::config::source::ValueSource;
    use crate::config::value::FieldValue;
    use tempfile::TempDir;

    fn loader_with(yaml: &str) -> (TempDir, ConfigLoader) {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(".bkpdir.yml");
        std::fs::write(&file, yaml).unwrap();
        let loader = ConfigLoader::load_with_env(
            ConfigPaths::with_files(vec![file]),
            ResolveMode::Inheritance,
            |_| None,
        );
        (temp, loader)
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("verification.*").unwrap();
        assert!(re.is_match("verification.verify_on_create"));
        assert!(!re.is_match("verificationXverify"));

        let re = glob_to_regex("max_?ackups").unwrap();
        assert!(re.is_match("max_backups"));
        assert!(!re.is_match("max_archives"));
    }

    #[test]
    fn test_find_fields_by_category() {
        let (_temp, loader) = loader_with("");
        let filter = FieldFilter::new().with_category(FieldCategory::StatusCodes);
        let fields = loader.find_fields(&filter).unwrap();
        assert_eq!(fields.len(), 9);
        assert!(fields.iter().all(|f| f.declared_name.starts_with("status_")));
    }

    #[test]
    fn test_find_fields_combined() {
        let (_temp, loader) = loader_with("");
        let filter = FieldFilter::new()
            .with_name("ARCHIVE")
            .with_glob("*_created_*")
            .unwrap();
        let paths: Vec<String> = loader
            .find_fields(&filter)
            .unwrap()
            .into_iter()
            .map(|f| f.dotted_path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "format_created_archive",
                "status_created_archive",
                "template_created_archive"
            ]
        );
    }

    #[test]
    fn test_field_by_path() {
        let (_temp, loader) = loader_with("verification:\n  checksum_algorithm: md5\n");
        let field = loader.field("verification.checksum_algorithm").unwrap().unwrap();
        assert_eq!(field.value, Some(FieldValue::String("md5".to_string())));

        let record = loader.field("verification").unwrap().unwrap();
        assert!(record.is_record);
        assert!(record.value.is_none());

        assert!(loader.field("nope").unwrap().is_none());
        assert!(loader.has_field("verification"));
        assert!(loader.has_field("max_backups"));
        assert!(!loader.has_field("max_backups.x"));
    }

    #[test]
    fn test_sources() {
        let (temp, loader) = loader_with("max_backups: 3\n");
        let sources = loader.sources().unwrap();

        let max = sources.iter().find(|v| v.name == "max_backups").unwrap();
        assert_eq!(
            max.source,
            ValueSource::File(temp.path().join(".bkpdir.yml"))
        );
        assert_eq!(max.value, "3");

        let other = sources.iter().find(|v| v.name == "max_archives").unwrap();
        assert_eq!(other.source, ValueSource::Default);
    }

    #[test]
    fn test_source_of() {
        let (_temp, loader) = loader_with("max_backups: 3\n");
        let value = loader.source_of("max_backups").unwrap().unwrap();
        assert_eq!(value.source, ValueSource::Config);

        let value = loader.source_of("max_archives").unwrap().unwrap();
        assert_eq!(value.source, ValueSource::Default);

        assert!(loader.source_of("verification").unwrap().is_none());
    }
}
