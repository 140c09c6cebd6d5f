//! Field Validator
//!
//! Pure checks over a field definition and a candidate value:
//!
//! - [`is_complete`]: is a required field answered? Booleans treat `false`
//!   as an answer; every other kind also rejects the empty string.
//! - [`check_value`]: does an answered value respect the field's type and
//!   validation metadata?
//! - [`sanitize_section`]: drop malformed fields and report how many.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::domain::value_objects::{
    Field, FieldKind, RawSection, SanitizedSection, Section, SectionId,
};

/// Completeness of a single field. `None` means no response entry exists.
pub fn is_complete(field: &Field, value: Option<&Value>) -> bool {
    if !field.required {
        return true;
    }
    match &field.kind {
        FieldKind::Boolean => !is_absent(value),
        FieldKind::Text
        | FieldKind::Textarea
        | FieldKind::Date
        | FieldKind::Time
        | FieldKind::Number
        | FieldKind::Select { .. }
        | FieldKind::Image => !is_absent(value) && !is_empty_string(value),
    }
}

/// Whether a value counts as "not answered" for constraint checking
pub fn is_blank(field: &Field, value: Option<&Value>) -> bool {
    match field.kind {
        FieldKind::Boolean => is_absent(value),
        _ => is_absent(value) || is_empty_string(value),
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn is_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s.is_empty())
}

/// Filter malformed fields out of a stored section
pub fn sanitize_section(raw: RawSection) -> SanitizedSection {
    let sanitized = SanitizedSection::from_raw(raw);
    if sanitized.removed_count() > 0 {
        tracing::warn!(
            section = %sanitized.section.id,
            removed = sanitized.removed_count(),
            "Dropped malformed fields from section"
        );
    }
    sanitized
}

/// Constraint violation on an answered value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueIssue {
    #[error("expected a {expected} value")]
    WrongType { expected: &'static str },
    #[error("must be at least {min}")]
    BelowMin { min: f64 },
    #[error("must be at most {max}")]
    AboveMax { max: f64 },
    #[error("{0}")]
    PatternMismatch(String),
    #[error("'{0}' is not one of the allowed options")]
    NotAnOption(String),
}

/// Check an answered value against the field kind and validation metadata.
/// Blank values are not checked; completeness is [`is_complete`]'s concern.
pub fn check_value(field: &Field, value: &Value) -> Result<(), ValueIssue> {
    if is_blank(field, Some(value)) {
        return Ok(());
    }

    match &field.kind {
        FieldKind::Boolean => {
            if !value.is_boolean() {
                return Err(ValueIssue::WrongType { expected: "boolean" });
            }
        }
        FieldKind::Number => {
            let number = as_number(value).ok_or(ValueIssue::WrongType { expected: "number" })?;
            if let Some(rules) = &field.validation {
                if let Some(min) = rules.min {
                    if number < min {
                        return Err(ValueIssue::BelowMin { min });
                    }
                }
                if let Some(max) = rules.max {
                    if number > max {
                        return Err(ValueIssue::AboveMax { max });
                    }
                }
            }
        }
        FieldKind::Select { options } => {
            let choice = value.as_str().ok_or(ValueIssue::WrongType { expected: "text" })?;
            if !options.iter().any(|o| o == choice) {
                return Err(ValueIssue::NotAnOption(choice.to_string()));
            }
        }
        FieldKind::Text
        | FieldKind::Textarea
        | FieldKind::Date
        | FieldKind::Time
        | FieldKind::Image => {
            let text = value.as_str().ok_or(ValueIssue::WrongType { expected: "text" })?;
            check_pattern(field, text)?;
        }
    }
    Ok(())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_pattern(field: &Field, text: &str) -> Result<(), ValueIssue> {
    let Some(rules) = &field.validation else {
        return Ok(());
    };
    let Some(pattern) = &rules.pattern else {
        return Ok(());
    };
    match Regex::new(pattern) {
        Ok(re) if re.is_match(text) => Ok(()),
        Ok(_) => Err(ValueIssue::PatternMismatch(
            rules
                .message
                .clone()
                .unwrap_or_else(|| format!("does not match pattern {pattern}")),
        )),
        Err(err) => {
            // A broken template pattern must not block the inspector.
            tracing::warn!(field = %field.id, error = %err, "Ignoring invalid validation pattern");
            Ok(())
        }
    }
}

/// Why submission is blocked
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Missing,
    Invalid(ValueIssue),
}

/// First field that prevents submission, in section then field order
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitBlock {
    pub section_id: SectionId,
    pub section_title: String,
    pub field_id: String,
    pub field_label: String,
    pub reason: BlockReason,
}

impl SubmitBlock {
    fn new(section: &Section, field: &Field, reason: BlockReason) -> Self {
        Self {
            section_id: section.id.clone(),
            section_title: section.title.clone(),
            field_id: field.id.clone(),
            field_label: field.label.clone(),
            reason,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.reason == BlockReason::Missing
    }
}

impl fmt::Display for SubmitBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            BlockReason::Missing => write!(
                f,
                "'{}' in section '{}' is required",
                self.field_label, self.section_title
            ),
            BlockReason::Invalid(issue) => write!(
                f,
                "'{}' in section '{}': {}",
                self.field_label, self.section_title, issue
            ),
        }
    }
}

/// Find the first incomplete required field across `sections`.
/// `lookup` returns the recorded value for a field id.
pub fn first_incomplete<'a, F>(sections: &[Section], lookup: F) -> Option<SubmitBlock>
where
    F: Fn(&str) -> Option<&'a Value>,
{
    sections.iter().find_map(|section| {
        section
            .fields
            .iter()
            .find(|field| !is_complete(field, lookup(&field.id)))
            .map(|field| SubmitBlock::new(section, field, BlockReason::Missing))
    })
}

/// Find the first answered field whose value breaks its constraints.
/// `lookup` returns the value to check for a field, if any.
pub fn first_invalid<'a, F>(sections: &[Section], lookup: F) -> Option<SubmitBlock>
where
    F: Fn(&Field) -> Option<&'a Value>,
{
    sections.iter().find_map(|section| {
        section.fields.iter().find_map(|field| {
            let value = lookup(field)?;
            check_value(field, value)
                .err()
                .map(|issue| SubmitBlock::new(section, field, BlockReason::Invalid(issue)))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::FieldValidation;
    use proptest::prelude::*;
    use serde_json::json;

    fn required(kind: FieldKind) -> Field {
        Field::new("f", "F", kind).required()
    }

    #[test]
    fn test_optional_field_always_complete() {
        let field = Field::new("f", "F", FieldKind::Text);
        assert!(is_complete(&field, None));
        assert!(is_complete(&field, Some(&json!(""))));
    }

    #[test]
    fn test_required_boolean_false_is_complete() {
        let field = required(FieldKind::Boolean);
        assert!(is_complete(&field, Some(&json!(false))));
        assert!(is_complete(&field, Some(&json!(true))));
        assert!(!is_complete(&field, None));
        assert!(!is_complete(&field, Some(&Value::Null)));
    }

    #[test]
    fn test_required_text_rejects_empty() {
        let field = required(FieldKind::Text);
        assert!(!is_complete(&field, Some(&json!(""))));
        assert!(!is_complete(&field, None));
        assert!(is_complete(&field, Some(&json!("ok"))));
    }

    #[test]
    fn test_required_number_zero_is_complete() {
        let field = required(FieldKind::Number);
        assert!(is_complete(&field, Some(&json!(0))));
    }

    #[test]
    fn test_sanitize_counts_removed_fields() {
        let raw: RawSection = serde_json::from_value(json!({
            "id": "general",
            "title": "General",
            "fields": [
                {"id": "a", "label": "A", "type": "text"},
                {"label": "missing id"},
                {"id": "c", "label": "C"}
            ]
        }))
        .unwrap();

        let sanitized = sanitize_section(raw);
        assert_eq!(sanitized.removed_count(), 2);
        assert_eq!(sanitized.section.fields.len(), 1);
        assert_eq!(sanitized.section.fields[0].id, "a");
    }

    #[test]
    fn test_number_bounds() {
        let field = required(FieldKind::Number).with_validation(FieldValidation {
            min: Some(0.0),
            max: Some(10.0),
            ..Default::default()
        });
        assert!(check_value(&field, &json!(5)).is_ok());
        assert!(check_value(&field, &json!("7")).is_ok());
        assert_eq!(check_value(&field, &json!(11)), Err(ValueIssue::AboveMax { max: 10.0 }));
        assert_eq!(check_value(&field, &json!(-1)), Err(ValueIssue::BelowMin { min: 0.0 }));
        assert!(matches!(check_value(&field, &json!("many")), Err(ValueIssue::WrongType { .. })));
    }

    #[test]
    fn test_pattern_with_custom_message() {
        let validation = FieldValidation {
            pattern: Some(r"^PTW-\d{4}$".into()),
            message: Some("use PTW-0000 format".into()),
            ..Default::default()
        };
        let field = Field::new("permit", "Permit no.", FieldKind::Text).with_validation(validation);
        assert!(check_value(&field, &json!("PTW-1234")).is_ok());
        assert_eq!(
            check_value(&field, &json!("1234")),
            Err(ValueIssue::PatternMismatch("use PTW-0000 format".into()))
        );
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let field = Field::new("x", "X", FieldKind::Text).with_validation(FieldValidation {
            pattern: Some("(".into()),
            ..Default::default()
        });
        assert!(check_value(&field, &json!("anything")).is_ok());
    }

    #[test]
    fn test_select_membership() {
        let field = required(FieldKind::Select { options: vec!["Pass".into(), "Fail".into()] });
        assert!(check_value(&field, &json!("Pass")).is_ok());
        assert_eq!(
            check_value(&field, &json!("Maybe")),
            Err(ValueIssue::NotAnOption("Maybe".into()))
        );
    }

    #[test]
    fn test_boolean_type_checked() {
        let field = required(FieldKind::Boolean);
        assert!(check_value(&field, &json!(false)).is_ok());
        assert!(matches!(check_value(&field, &json!("")), Err(ValueIssue::WrongType { .. })));
    }

    #[test]
    fn test_first_incomplete_follows_section_order() {
        let sections = vec![
            Section::new("one", "One").with_field(Field::new("a", "A", FieldKind::Text)),
            Section::new("two", "Two")
                .with_field(Field::new("b", "B", FieldKind::Text).required())
                .with_field(Field::new("c", "C", FieldKind::Text).required()),
        ];
        let block = first_incomplete(&sections, |_| None).unwrap();
        assert_eq!(block.section_id, SectionId::from("two"));
        assert_eq!(block.field_id, "b");
        assert!(block.is_missing());
    }

    proptest! {
        #[test]
        fn prop_required_boolean_complete_for_any_bool(answer in any::<bool>()) {
            let field = required(FieldKind::Boolean);
            prop_assert!(is_complete(&field, Some(&json!(answer))));
        }

        #[test]
        fn prop_required_text_never_complete_when_empty(kind_idx in 0usize..5) {
            let kinds = [
                FieldKind::Text,
                FieldKind::Textarea,
                FieldKind::Date,
                FieldKind::Time,
                FieldKind::Image,
            ];
            let field = required(kinds[kind_idx].clone());
            prop_assert!(!is_complete(&field, Some(&json!(""))));
        }

        #[test]
        fn prop_sanitize_drops_exactly_malformed(valid in 0usize..8, broken in 0usize..8) {
            let mut fields = Vec::new();
            for i in 0..valid {
                fields.push(json!({"id": format!("ok{i}"), "label": "Valid", "type": "text"}));
            }
            for _ in 0..broken {
                fields.push(json!({"label": "no id", "type": "text"}));
            }
            let raw = RawSection { fields: Value::Array(fields), ..Default::default() };
            let sanitized = SanitizedSection::from_raw(raw);
            prop_assert_eq!(sanitized.removed_count(), broken);
            prop_assert_eq!(sanitized.section.fields.len(), valid);
        }
    }
}
