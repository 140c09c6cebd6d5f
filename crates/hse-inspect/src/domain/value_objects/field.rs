//! Field value objects
//!
//! A [`Field`] is always well-formed: it has a non-empty id, a non-empty
//! label and a kind from the closed [`FieldKind`] set. Untrusted documents
//! arrive as [`RawField`] and are converted with `Field::try_from`, which
//! reports why a field was rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One question in a template section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField")]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
}

/// Closed set of field types
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Date,
    Time,
    Number,
    Boolean,
    Select { options: Vec<String> },
    Image,
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::Time => "time",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select { .. } => "select",
            Self::Image => "image",
        }
    }

    /// Resolve a stored type tag. `select` needs a non-empty option list.
    pub fn parse(type_name: &str, options: Option<Vec<String>>) -> Result<Self, MalformedField> {
        let kind = match type_name {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "date" => Self::Date,
            "time" => Self::Time,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "image" => Self::Image,
            "select" => match options {
                Some(options) if !options.is_empty() => Self::Select { options },
                _ => return Err(MalformedField::SelectWithoutOptions),
            },
            other => return Err(MalformedField::UnknownType(other.to_string())),
        };
        Ok(kind)
    }
}

/// Validation metadata attached to a field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            placeholder: None,
            validation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, FieldKind::Boolean)
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            FieldKind::Select { options } => options,
            _ => &[],
        }
    }
}

/// Field as found in stored or imported documents; every attribute optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawField {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub validation: Option<FieldValidation>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// Reason a raw field was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedField {
    #[error("field has no id")]
    MissingId,
    #[error("field has no label")]
    MissingLabel,
    #[error("field has no type")]
    MissingType,
    #[error("unknown field type: {0}")]
    UnknownType(String),
    #[error("select field has no options")]
    SelectWithoutOptions,
    #[error("duplicate field id: {0}")]
    DuplicateId(String),
    #[error("field entry could not be read")]
    Unreadable,
}

impl TryFrom<RawField> for Field {
    type Error = MalformedField;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .as_ref()
            .and_then(id_text)
            .ok_or(MalformedField::MissingId)?;
        let label = raw
            .label
            .filter(|l| !l.trim().is_empty())
            .ok_or(MalformedField::MissingLabel)?;
        let type_name = raw
            .field_type
            .filter(|t| !t.trim().is_empty())
            .ok_or(MalformedField::MissingType)?;
        let kind = FieldKind::parse(type_name.trim(), raw.options)?;

        Ok(Self {
            id,
            label,
            kind,
            required: raw.required.unwrap_or(false),
            placeholder: raw.placeholder,
            validation: raw.validation,
        })
    }
}

// Ids are accepted as strings or numbers; anything else counts as missing.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_round_trip_shape() {
        let kind = FieldKind::Select { options: vec!["Yes".into(), "No".into()] };
        let field = Field::new("ppe", "PPE worn", kind).required();
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "select");
        assert_eq!(json["options"], json!(["Yes", "No"]));
        assert_eq!(json["required"], true);

        let back: Field = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_numeric_id_accepted() {
        let field: Field =
            serde_json::from_value(json!({"id": 7, "label": "Count", "type": "number"})).unwrap();
        assert_eq!(field.id, "7");
        assert_eq!(field.kind, FieldKind::Number);
        assert!(!field.required);
    }

    #[test]
    fn test_missing_type_rejected() {
        let raw: RawField = serde_json::from_value(json!({"id": "c", "label": "C"})).unwrap();
        assert_eq!(Field::try_from(raw), Err(MalformedField::MissingType));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw: RawField =
            serde_json::from_value(json!({"id": "c", "label": "C", "type": "signature"})).unwrap();
        assert_eq!(Field::try_from(raw), Err(MalformedField::UnknownType("signature".into())));
    }

    #[test]
    fn test_select_without_options_rejected() {
        let raw: RawField = serde_json::from_value(
            json!({"id": "s", "label": "S", "type": "select", "options": []}),
        )
        .unwrap();
        assert_eq!(Field::try_from(raw), Err(MalformedField::SelectWithoutOptions));
    }
}
