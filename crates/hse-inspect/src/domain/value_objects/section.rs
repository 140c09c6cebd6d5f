//! Section value objects
//!
//! Sections are deserialized through [`RawSection`] so that stored documents
//! with malformed fields, or with a `fields` value that is not a list, still
//! load. Dropped fields are counted on the section for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use super::field::{Field, MalformedField, RawField};

/// Section identifier; stored documents use both strings and numbers
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<i64> for SectionId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

/// Ordered, named group of well-formed fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSection", rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip)]
    dropped_fields: usize,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
            order: None,
            dropped_fields: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// Number of malformed fields removed when this section was loaded
    pub fn dropped_fields(&self) -> usize {
        self.dropped_fields
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}

/// Section as found in stored or imported documents
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawSection {
    #[serde(default)]
    pub id: Option<SectionId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Kept untyped: anything other than a list is read as no fields
    #[serde(default)]
    pub fields: Value,
    #[serde(default)]
    pub order: Option<u32>,
}

/// A cleaned section plus the per-field rejection reasons
#[derive(Clone, Debug)]
pub struct SanitizedSection {
    pub section: Section,
    pub removed: Vec<MalformedField>,
}

impl SanitizedSection {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn from_raw(raw: RawSection) -> Self {
        let entries = match raw.fields {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };

        let mut fields = Vec::with_capacity(entries.len());
        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        for entry in entries {
            let parsed = serde_json::from_value::<RawField>(entry)
                .map_err(|_| MalformedField::Unreadable)
                .and_then(Field::try_from)
                .and_then(|field| {
                    // The first field with an id owns its response
                    if seen.insert(field.id.clone()) {
                        Ok(field)
                    } else {
                        Err(MalformedField::DuplicateId(field.id))
                    }
                });
            match parsed {
                Ok(field) => fields.push(field),
                Err(reason) => removed.push(reason),
            }
        }

        let section = Section {
            id: raw
                .id
                .unwrap_or_else(|| SectionId::Text(uuid::Uuid::new_v4().to_string())),
            title: raw.title.unwrap_or_default(),
            description: raw.description,
            fields,
            order: raw.order,
            dropped_fields: removed.len(),
        };
        Self { section, removed }
    }
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        SanitizedSection::from_raw(raw).section
    }
}
