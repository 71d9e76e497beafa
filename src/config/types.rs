//! Configuration document types.
//!
//! [`Config`] is the fully populated configuration document. Every resolution
//! starts from `Config::default()`, so a field is never absent, only at its
//! default.

use super::schema::{FieldShape, Reflect, TypeShape};
use serde::{Deserialize, Serialize};

/// Resolved configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Basic settings
    /// Directory where archives are written.
    pub archive_dir_path: String,
    /// Name archives after the current directory.
    pub use_current_dir_name: bool,
    /// Glob patterns excluded from archives.
    pub exclude_patterns: Vec<String>,
    /// Embed git branch and hash in archive names.
    pub include_git_info: bool,
    /// Note appended to archive names when none is given.
    pub default_note: Option<String>,
    /// Maximum number of archives kept per directory (0 = unlimited).
    pub max_archives: i64,

    /// Parent config files, absolute or relative to this file.
    pub inherit: Vec<String>,

    // Backup settings
    pub backup_dir_path: String,
    pub use_current_dir_name_for_files: bool,
    pub max_backups: i64,

    // Status codes
    pub status_created_archive: i64,
    pub status_created_backup: i64,
    pub status_config_error: i64,
    pub status_directory_not_found: i64,
    pub status_file_not_found: i64,
    pub status_invalid_directory_type: i64,
    pub status_permission_denied: i64,
    pub status_disk_full: i64,
    pub status_failed_to_create_archive_directory: i64,

    // Printf-style format strings
    pub format_created_archive: String,
    pub format_identical_archive: String,
    pub format_list_archive: String,
    pub format_created_backup: String,
    pub format_config_value: String,
    pub format_error: String,

    // Named-placeholder templates
    pub template_created_archive: String,
    pub template_list_archive: String,
    pub template_created_backup: String,
    pub template_config_value: String,
    pub template_error: String,

    // Regex patterns with named groups
    pub pattern_archive_filename: String,
    pub pattern_backup_filename: String,
    pub pattern_config_line: String,

    /// Archive verification settings.
    pub verification: Option<VerificationConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_dir_path: default_dir_path(),
            use_current_dir_name: true,
            exclude_patterns: vec![".git/".to_string(), "vendor/".to_string()],
            include_git_info: false,
            default_note: None,
            max_archives: 0,

            inherit: Vec::new(),

            backup_dir_path: default_dir_path(),
            use_current_dir_name_for_files: true,
            max_backups: 0,

            status_created_archive: 0,
            status_created_backup: 0,
            status_config_error: 10,
            status_directory_not_found: 20,
            status_file_not_found: 20,
            status_invalid_directory_type: 21,
            status_permission_denied: 22,
            status_disk_full: 30,
            status_failed_to_create_archive_directory: 31,

            format_created_archive: "Created archive: %s\n".to_string(),
            format_identical_archive: "Directory is identical to existing archive: %s\n"
                .to_string(),
            format_list_archive: "%s (created: %s)\n".to_string(),
            format_created_backup: "Created backup: %s\n".to_string(),
            format_config_value: "%s: %s (source: %s)\n".to_string(),
            format_error: "Error: %s\n".to_string(),

            template_created_archive: "Created archive: %{path}\n".to_string(),
            template_list_archive: "%{path} (created: %{creation_time})\n".to_string(),
            template_created_backup: "Created backup: %{path}\n".to_string(),
            template_config_value: "%{name}: %{value} (source: %{source})\n".to_string(),
            template_error: "Error: %{message}\n".to_string(),

            pattern_archive_filename: r"(?P<prefix>[^-]*)-(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})-(?P<hour>\d{2})-(?P<minute>\d{2})(?:=(?P<branch>[^=]+))?(?:=(?P<hash>[^=]+))?(?:=(?P<note>.+))?\.zip".to_string(),
            pattern_backup_filename: r"(?P<filename>[^/]+)-(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})-(?P<hour>\d{2})-(?P<minute>\d{2})(?:=(?P<note>.+))?".to_string(),
            pattern_config_line: r"(?P<name>[^:]+):\s*(?P<value>[^(]+)\s*\(source:\s*(?P<source>[^)]+)\)".to_string(),

            verification: Some(VerificationConfig::default()),
        }
    }
}

fn default_dir_path() -> String {
    "../.bkpdir".to_string()
}

/// Archive verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Verify each archive right after creating it.
    pub verify_on_create: bool,
    /// Checksum algorithm used for verification.
    pub checksum_algorithm: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            verify_on_create: false,
            checksum_algorithm: "sha256".to_string(),
        }
    }
}

impl Reflect for VerificationConfig {
    fn shape() -> TypeShape {
        TypeShape::record(
            "VerificationConfig",
            vec![
                FieldShape::new("verify_on_create", TypeShape::Bool),
                FieldShape::new("checksum_algorithm", TypeShape::String),
            ],
        )
    }
}

impl Reflect for Config {
    fn shape() -> TypeShape {
        use TypeShape::{Bool, Int, String};
        let strings = || TypeShape::list(String);

        TypeShape::record(
            "Config",
            vec![
                FieldShape::new("archive_dir_path", String),
                FieldShape::new("use_current_dir_name", Bool),
                FieldShape::new("exclude_patterns", strings()),
                FieldShape::new("include_git_info", Bool),
                FieldShape::new("default_note", TypeShape::optional(String)),
                FieldShape::new("max_archives", Int),
                FieldShape::new("inherit", strings()),
                FieldShape::new("backup_dir_path", String),
                FieldShape::new("use_current_dir_name_for_files", Bool),
                FieldShape::new("max_backups", Int),
                FieldShape::new("status_created_archive", Int),
                FieldShape::new("status_created_backup", Int),
                FieldShape::new("status_config_error", Int),
                FieldShape::new("status_directory_not_found", Int),
                FieldShape::new("status_file_not_found", Int),
                FieldShape::new("status_invalid_directory_type", Int),
                FieldShape::new("status_permission_denied", Int),
                FieldShape::new("status_disk_full", Int),
                FieldShape::new("status_failed_to_create_archive_directory", Int),
                FieldShape::new("format_created_archive", String),
                FieldShape::new("format_identical_archive", String),
                FieldShape::new("format_list_archive", String),
                FieldShape::new("format_created_backup", String),
                FieldShape::new("format_config_value", String),
                FieldShape::new("format_error", String),
                FieldShape::new("template_created_archive", String),
                FieldShape::new("template_list_archive", String),
                FieldShape::new("template_created_backup", String),
                FieldShape::new("template_config_value", String),
                FieldShape::new("template_error", String),
                FieldShape::new("pattern_archive_filename", String),
                FieldShape::new("pattern_backup_filename", String),
                FieldShape::new("pattern_config_line", String),
                FieldShape::new(
                    "verification",
                    TypeShape::optional(VerificationConfig::shape()),
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_shape_matches_serialization() {
        let value = serde_json::to_value(Config::default()).unwrap();
        let Value::Object(map) = value else {
            panic!("config should serialize to an object");
        };
        let TypeShape::Record(record) = Config::shape() else {
            panic!("config shape should be a record");
        };

        let mut tags: Vec<&str> = record.fields.iter().map(|f| f.tag).collect();
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        tags.sort();
        keys.sort();
        assert_eq!(tags, keys);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("archive_dir_path: ./a\n").unwrap();
        assert_eq!(config.archive_dir_path, "./a");
        assert_eq!(config.exclude_patterns, vec![".git/", "vendor/"]);
        assert_eq!(config.status_disk_full, 30);
    }

    #[test]
    fn test_partial_verification_keeps_defaults() {
        let config: Config =
            serde_yaml::from_str("verification:\n  verify_on_create: true\n").unwrap();
        let verification = config.verification.unwrap();
        assert!(verification.verify_on_create);
        assert_eq!(verification.checksum_algorithm, "sha256");
    }
}
