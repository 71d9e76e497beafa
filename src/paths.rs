//! Config file path resolution.
//!
//! This module resolves file references the way config files write them:
//! - Absolute references are taken as-is
//! - Relative references are relative to the directory of the referencing file
//! - `~` expands to the home directory
//!
//! Resolution is pure path manipulation (no filesystem I/O); only
//! [`validate`] touches the filesystem.

use crate::error::{ConfigError, ConfigResult};
use std::path::{Component, Path, PathBuf};

/// Resolve `path` relative to the file that references it.
///
/// Absolute paths pass through unchanged. An empty `base` leaves `path`
/// unchanged. Otherwise `path` is joined to the directory of `base` and
/// lexically normalized.
pub fn resolve(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        return path.to_path_buf();
    }

    let dir = base.parent().unwrap_or_else(|| Path::new(""));
    normalize_path_components(&dir.join(path))
}

/// Check that `path` names an existing regular file.
pub fn validate(path: &Path) -> ConfigResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(ConfigError::path_invalid(path, "not a regular file")),
        Err(e) => Err(ConfigError::path_invalid(path, e.to_string())),
    }
}

/// Expand a leading `~` to the home directory.
///
/// Paths without a leading `~`, and all paths when no home directory is
/// known, are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    expand_tilde_with(path, home.as_deref())
}

/// [`expand_tilde`] against an explicit home directory.
pub(crate) fn expand_tilde_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };

    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Make `path` absolute by joining it to `cwd` when relative.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path_components(path)
    } else {
        normalize_path_components(&cwd.join(path))
    }
}

/// Normalize path components (resolve . and ..) without touching the filesystem.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => {
                // Windows drive prefix (e.g., C:)
                components.push(Component::Prefix(p));
            }
            Component::RootDir => {
                components.push(Component::RootDir);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else if let Some(Component::RootDir) = components.last() {
                    // `/..` is `/`
                } else {
                    components.push(Component::ParentDir);
                }
            }
            Component::Normal(name) => {
                components.push(Component::Normal(name));
            }
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_absolute_unchanged() {
        let result = resolve(Path::new("/etc/base.yml"), Path::new("/home/u/child.yml"));
        assert_eq!(result, PathBuf::from("/etc/base.yml"));
    }

    #[test]
    fn test_resolve_empty_base_unchanged() {
        let result = resolve(Path::new("./conf/base.yml"), Path::new(""));
        assert_eq!(result, PathBuf::from("./conf/base.yml"));
    }

    #[test]
    fn test_resolve_relative_to_referencing_file() {
        let result = resolve(Path::new("base.yml"), Path::new("/proj/conf/child.yml"));
        assert_eq!(result, PathBuf::from("/proj/conf/base.yml"));

        let result = resolve(
            Path::new("../shared/./base.yml"),
            Path::new("/proj/conf/child.yml"),
        );
        assert_eq!(result, PathBuf::from("/proj/shared/base.yml"));
    }

    #[test]
    fn test_validate_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = validate(&temp.path().join("missing.yml")).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::PathInvalid);
    }

    #[test]
    fn test_validate_rejects_directory() {
        let temp = TempDir::new().unwrap();
        assert!(validate(temp.path()).is_err());

        let file = temp.path().join("ok.yml");
        std::fs::write(&file, "").unwrap();
        assert!(validate(&file).is_ok());
    }

    #[test]
    fn test_expand_tilde() {
        let home = Path::new("/home/alice");
        assert_eq!(
            expand_tilde_with("~/.bkpdir.yml", Some(home)),
            PathBuf::from("/home/alice/.bkpdir.yml")
        );
        assert_eq!(expand_tilde_with("~", Some(home)), PathBuf::from("/home/alice"));
        assert_eq!(
            expand_tilde_with("./.bkpdir.yml", Some(home)),
            PathBuf::from("./.bkpdir.yml")
        );
        assert_eq!(
            expand_tilde_with("~/.bkpdir.yml", None),
            PathBuf::from("~/.bkpdir.yml")
        );
    }

    #[test]
    fn test_absolutize() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            absolutize(Path::new("./.bkpdir.yml"), cwd),
            PathBuf::from("/work/project/.bkpdir.yml")
        );
        assert_eq!(
            absolutize(Path::new("/etc/bkpdir.yml"), cwd),
            PathBuf::from("/etc/bkpdir.yml")
        );
    }

    #[test]
    fn test_normalize_parent_at_root() {
        assert_eq!(
            normalize_path_components(Path::new("/../a/b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(
            normalize_path_components(Path::new("../a")),
            PathBuf::from("../a")
        );
    }
}
