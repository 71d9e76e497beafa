//! Output formatting for resolved configuration.

use crate::config::{FieldCategory, FieldDescriptor, ResolvedValue};
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `name: value (source: source)` lines.
    #[default]
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    json.push('\n');
    json
}

/// Format resolved values with their sources.
pub fn format_values(values: &[ResolvedValue], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(values),
        OutputFormat::Text => values
            .iter()
            .map(|v| format!("{}: {} (source: {})\n", v.name, v.value, v.source))
            .collect(),
        OutputFormat::Markdown => {
            let mut md = String::new();
            md.push_str(&format!("# Configuration ({})\n\n", values.len()));
            md.push_str("| name | value | source |\n|---|---|---|\n");
            for v in values {
                md.push_str(&format!("| `{}` | `{}` | {} |\n", v.name, v.value, v.source));
            }
            md
        }
    }
}

/// Format field descriptors; Markdown groups them by category.
pub fn format_fields(fields: &[FieldDescriptor], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(fields),
        OutputFormat::Text => fields
            .iter()
            .map(|f| {
                format!(
                    "{} ({}, {}) = {}\n",
                    f.dotted_path,
                    f.kind,
                    f.category,
                    f.value_text()
                )
            })
            .collect(),
        OutputFormat::Markdown => format_fields_markdown(fields),
    }
}

fn format_fields_markdown(fields: &[FieldDescriptor]) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Fields ({})\n\n", fields.len()));

    let mut by_category: HashMap<FieldCategory, Vec<&FieldDescriptor>> = HashMap::new();
    for field in fields {
        by_category.entry(field.category).or_default().push(field);
    }

    for category in FieldCategory::ALL {
        let Some(group) = by_category.get(&category) else {
            continue;
        };
        md.push_str(&format!("## {}\n\n", format_category_name(category)));
        for field in group {
            let pointer = if field.is_pointer { " (optional)" } else { "" };
            md.push_str(&format!(
                "- `{}`: {}{} = `{}`\n",
                field.dotted_path,
                field.kind,
                pointer,
                field.value_text()
            ));
        }
        md.push('\n');
    }

    md
}

/// Format a category for display (capitalize, replace underscores with spaces).
fn format_category_name(category: FieldCategory) -> String {
    category
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format the files applied during resolution, in order.
pub fn format_chain(files: &[PathBuf], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(files),
        OutputFormat::Text => files
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{}. {}\n", i + 1, f.display()))
            .collect(),
        OutputFormat::Markdown => {
            let mut md = String::from("# Inheritance chain\n\n");
            for (i, file) in files.iter().enumerate() {
                md.push_str(&format!("{}. `{}`\n", i + 1, file.display()));
            }
            md
        }
    }
}

/// Format problems recovered from during resolution.
pub fn format_problems(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(|p| format!("warning: {}\n", p))
        .collect()
}
