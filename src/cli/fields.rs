//! Fields subcommand for bkpdir CLI
//!
//! Lists configuration fields, optionally filtered.

use crate::config::{FieldCategory, FieldFilter};
use crate::format::OutputFormat;
use clap::Args;

/// Arguments for the fields subcommand
#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Only fields in this category, e.g. status-codes or verification
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<FieldCategory>,

    /// Only fields whose dotted path contains this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub name: Option<String>,

    /// Only fields whose dotted path matches this glob (`*`, `?`)
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,

    /// Output format: text (default), json, or markdown
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,
}

impl FieldsArgs {
    /// Build the filter described by these arguments.
    pub fn filter(&self) -> Result<FieldFilter, regex_lite::Error> {
        let mut filter = FieldFilter::new();
        if let Some(ref name) = self.name {
            filter = filter.with_name(name.as_str());
        }
        if let Some(category) = self.category {
            filter = filter.with_category(category);
        }
        if let Some(ref pattern) = self.pattern {
            filter = filter.with_glob(pattern)?;
        }
        Ok(filter)
    }
}
