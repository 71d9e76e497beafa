//! Inheritance chain building.
//!
//! A config file may list parent files under `inherit`. The chain is the
//! ordered list of files to apply for one starting file: every parent comes
//! before the files that inherit from it.

use crate::error::{ConfigError, ConfigResult};
use crate::paths;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Only the `inherit` key of a config file.
#[derive(Debug, Default, Deserialize)]
struct InheritOnly {
    #[serde(default)]
    inherit: Vec<String>,
}

/// Read the `inherit` list of a file without decoding the rest of it.
pub fn read_inherit_list(path: &Path) -> ConfigResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::decode(path, e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let partial: Option<InheritOnly> =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::decode(path, e))?;
    Ok(partial.unwrap_or_default().inherit)
}

/// Ordered config files for one starting file, parents first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceChain {
    files: Vec<PathBuf>,
}

impl InheritanceChain {
    /// Build the chain rooted at `start`.
    ///
    /// Fails with `CircularDependency` when a file is reached twice and with
    /// `PathInvalid` when a file is missing. A file whose `inherit` list
    /// cannot be decoded is kept without parents. `~` in `inherit` entries
    /// expands to the home directory.
    pub fn build(start: &Path) -> ConfigResult<Self> {
        Self::build_with_home(start, dirs::home_dir())
    }

    pub(crate) fn build_with_home(start: &Path, home: Option<PathBuf>) -> ConfigResult<Self> {
        let mut builder = ChainBuilder {
            home,
            ..ChainBuilder::default()
        };
        let start = paths::normalize_path_components(start);
        builder.visit(&start, Path::new(""))?;
        debug!(
            start = %start.display(),
            files = builder.chain.len(),
            "Built inheritance chain"
        );
        Ok(Self {
            files: builder.chain,
        })
    }

    /// Files in application order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Default)]
struct ChainBuilder {
    chain: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
    home: Option<PathBuf>,
}

impl ChainBuilder {
    fn visit(&mut self, path: &Path, base: &Path) -> ConfigResult<()> {
        let resolved = paths::resolve(path, base);

        if self.visited.contains(&resolved) {
            return Err(ConfigError::circular(&resolved));
        }
        paths::validate(&resolved)?;
        self.visited.insert(resolved.clone());

        let parents = match read_inherit_list(&resolved) {
            Ok(parents) => parents,
            Err(err) => {
                warn!("{}; treating it as having no parents", err);
                Vec::new()
            }
        };

        for parent in &parents {
            let parent = paths::expand_tilde_with(parent, self.home.as_deref());
            self.visit(&parent, &resolved)?;
        }

        self.chain.push(resolved);
        Ok(())
    }
}
