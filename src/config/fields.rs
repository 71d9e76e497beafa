//! Field discovery over configuration documents.
//!
//! Walks a document's declared shape together with its serialized value tree
//! and produces a flat list of leaf [`FieldDescriptor`]s:
//! - Nested records expand into dotted leaves (`verification.verify_on_create`);
//!   the record itself is not a leaf
//! - An absent optional reports the zero value of its declared type
//! - Categories come from declared names and are inherited by nested leaves
//! - The list is sorted by declared name

use super::schema::{FieldShape, Reflect, TypeShape};
use super::value::{FieldKind, FieldValue, lookup};
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Category of a configuration field, derived from its declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    StatusCodes,
    FormatStrings,
    TemplateStrings,
    RegexPatterns,
    Verification,
    Inheritance,
    BackupSettings,
    ArchiveSettings,
    BasicSettings,
}

impl FieldCategory {
    /// All categories, in display order.
    pub const ALL: [FieldCategory; 9] = [
        FieldCategory::BasicSettings,
        FieldCategory::ArchiveSettings,
        FieldCategory::BackupSettings,
        FieldCategory::Inheritance,
        FieldCategory::Verification,
        FieldCategory::StatusCodes,
        FieldCategory::FormatStrings,
        FieldCategory::TemplateStrings,
        FieldCategory::RegexPatterns,
    ];

    /// Categorize a declared field name.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("status_") {
            FieldCategory::StatusCodes
        } else if name.starts_with("format_") {
            FieldCategory::FormatStrings
        } else if name.starts_with("template_") {
            FieldCategory::TemplateStrings
        } else if name.starts_with("pattern_") {
            FieldCategory::RegexPatterns
        } else if name.contains("verification") {
            FieldCategory::Verification
        } else if name.contains("inherit") {
            FieldCategory::Inheritance
        } else if name.contains("backup") {
            FieldCategory::BackupSettings
        } else if name.contains("archive") {
            FieldCategory::ArchiveSettings
        } else {
            FieldCategory::BasicSettings
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::StatusCodes => "status_codes",
            FieldCategory::FormatStrings => "format_strings",
            FieldCategory::TemplateStrings => "template_strings",
            FieldCategory::RegexPatterns => "regex_patterns",
            FieldCategory::Verification => "verification",
            FieldCategory::Inheritance => "inheritance",
            FieldCategory::BackupSettings => "backup_settings",
            FieldCategory::ArchiveSettings => "archive_settings",
            FieldCategory::BasicSettings => "basic_settings",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('-', "_");
        FieldCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = FieldCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!(
                    "Invalid category '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// Metadata (and optionally the current value) of one configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Declared name of the leaf field.
    pub declared_name: String,
    /// Serialized key of the leaf field.
    pub external_name: String,
    pub kind: FieldKind,
    pub category: FieldCategory,
    /// Serialized keys from the document root, joined with `.`.
    pub dotted_path: String,
    pub is_pointer: bool,
    pub is_list: bool,
    pub is_record: bool,
    /// Current value; `None` for metadata-only descriptors and records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl FieldDescriptor {
    /// Descriptor of a declared field; `None` when its shape has no [`FieldKind`].
    fn from_shape(
        field: &FieldShape,
        prefix: Option<&str>,
        inherited: Option<FieldCategory>,
    ) -> Option<Self> {
        let (inner, is_pointer) = field.shape.unwrap_optional();
        let kind = FieldKind::from_shape(inner)?;
        let dotted_path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field.tag),
            None => field.tag.to_string(),
        };

        Some(Self {
            declared_name: field.name.to_string(),
            external_name: field.tag.to_string(),
            kind,
            category: inherited.unwrap_or_else(|| FieldCategory::from_name(field.name)),
            dotted_path,
            is_pointer,
            is_list: matches!(inner, TypeShape::List(_)),
            is_record: matches!(inner, TypeShape::Record(_)),
            value: None,
        })
    }

    /// Copy without the value.
    pub fn without_value(&self) -> Self {
        Self {
            value: None,
            ..self.clone()
        }
    }

    /// Fill in the value found at this descriptor's path in a document value tree.
    pub fn refresh_value(&mut self, document: &Value) {
        self.value = if self.is_record {
            None
        } else {
            FieldValue::from_json_or_zero(self.kind, lookup(document, &self.dotted_path))
        };
    }

    /// The current value as display text (empty when unknown).
    pub fn value_text(&self) -> String {
        self.value.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

/// Serialize a document into the value tree discovery and merging work on.
pub fn document_value<T: Serialize>(document: &T) -> ConfigResult<Value> {
    Ok(serde_json::to_value(document)?)
}

/// Leaf metadata of a document type, sorted, without values.
pub fn discover_metadata<T: Reflect>() -> Vec<FieldDescriptor> {
    let mut descriptors = Vec::new();
    if let TypeShape::Record(record) = T::shape() {
        collect_leaves(&record.fields, None, None, &mut descriptors);
    }
    sort_descriptors(&mut descriptors);
    descriptors
}

/// Leaf descriptors of a document, sorted, with current values.
pub fn discover_fields<T: Reflect>(document: &T) -> ConfigResult<Vec<FieldDescriptor>> {
    let mut descriptors = discover_metadata::<T>();
    populate_values(&mut descriptors, &document_value(document)?);
    Ok(descriptors)
}

/// Refresh the value of every descriptor from a document value tree.
pub fn populate_values(descriptors: &mut [FieldDescriptor], document: &Value) {
    for descriptor in descriptors.iter_mut() {
        descriptor.refresh_value(document);
    }
}

/// Describe any node (leaf or record) of a document type by dotted path.
pub fn describe_path<T: Reflect>(path: &str) -> Option<FieldDescriptor> {
    let shape = T::shape();
    let mut fields = match &shape {
        TypeShape::Record(record) => &record.fields,
        _ => return None,
    };
    let mut prefix: Option<String> = None;
    let mut category: Option<FieldCategory> = None;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let field = fields.iter().find(|f| f.tag == segment)?;
        let descriptor = FieldDescriptor::from_shape(field, prefix.as_deref(), category)?;
        if segments.peek().is_none() {
            return Some(descriptor);
        }

        match field.shape.unwrap_optional().0 {
            TypeShape::Record(record) => fields = &record.fields,
            _ => return None,
        }
        category = Some(descriptor.category);
        prefix = Some(descriptor.dotted_path);
    }

    None
}

fn collect_leaves(
    fields: &[FieldShape],
    prefix: Option<&str>,
    inherited: Option<FieldCategory>,
    out: &mut Vec<FieldDescriptor>,
) {
    for field in fields {
        let Some(descriptor) = FieldDescriptor::from_shape(field, prefix, inherited) else {
            warn!(field = field.name, "Skipping field with unsupported shape");
            continue;
        };
        if let TypeShape::Record(record) = field.shape.unwrap_optional().0 {
            collect_leaves(
                &record.fields,
                Some(&descriptor.dotted_path),
                Some(descriptor.category),
                out,
            );
        } else {
            out.push(descriptor);
        }
    }
}

fn sort_descriptors(descriptors: &mut [FieldDescriptor]) {
    descriptors.sort_by(|a, b| {
        a.declared_name
            .cmp(&b.declared_name)
            .then_with(|| a.dotted_path.cmp(&b.dotted_path))
    });
}
