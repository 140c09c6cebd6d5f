//! Inspection Aggregate
//!
//! One occurrence of filling out a template. Sections are copied from the
//! template when the inspection is materialized, so later template edits
//! never reach an inspection already in flight.
//!
//! # Lifecycle
//! ```text
//! pending ──► in-progress ──► completed
//!    └──────────────────────────▲
//! ```
//! `completed` is terminal: responses, photos and findings are frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use thiserror::Error;

use crate::config::MaterializeConfig;
use crate::domain::aggregates::Template;
use crate::domain::events::{DomainEvent, InspectionEvent};
use crate::domain::services::{first_incomplete, first_invalid, is_complete, SubmitBlock};
use crate::domain::value_objects::{
    Field, FieldKind, InspectionId, InspectionPriority, Response, Section, SectionId, TemplateId,
};

const UNTITLED: &str = "Untitled Inspection";
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Format `now`, falling back to `fallback` when `format` has a bad specifier
fn format_now(now: DateTime<Utc>, format: &str, fallback: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_ok() {
        return out;
    }
    tracing::warn!(format, "Unusable date/time format, using default");
    now.format(fallback).to_string()
}

/// Inspection aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    id: InspectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template_id: Option<TemplateId>,
    title: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    inspector: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    status: InspectionStatus,
    #[serde(default)]
    priority: InspectionPriority,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    responses: Vec<Response>,
    #[serde(default)]
    photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default)]
    issues: u32,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InspectionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown inspection status: {other}")),
        }
    }
}

/// What an inspection is materialized from
#[derive(Clone, Debug)]
pub enum InspectionSource<'a> {
    Template(&'a Template),
    /// Ad-hoc inspection without a template reference
    Sections(Vec<Section>),
}

/// Caller-supplied header values; anything left `None` gets a default
#[derive(Clone, Debug, Default)]
pub struct InspectionOverrides {
    pub title: Option<String>,
    pub location: Option<String>,
    pub inspector: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub priority: Option<InspectionPriority>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    /// Pre-filled answers; these are never overwritten by seeded defaults
    pub responses: Vec<Response>,
}

/// Findings recorded alongside completion
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Findings {
    pub issues: u32,
    pub score: Option<f64>,
}

/// Per-section completion summary
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionProgress {
    pub section_id: SectionId,
    pub title: String,
    pub required: usize,
    pub answered_required: usize,
    pub complete: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InspectionProgress {
    pub sections: Vec<SectionProgress>,
    pub required: usize,
    pub answered_required: usize,
    /// Share of required fields answered, 0..=100
    pub percent: u8,
}

impl Inspection {
    /// Create a pending inspection from a template or ad-hoc sections
    pub fn materialize(
        source: InspectionSource<'_>,
        overrides: InspectionOverrides,
        defaults: &MaterializeConfig,
    ) -> Self {
        let now = Utc::now();
        let (template_id, template_title, template_category, template_description, sections) =
            match source {
                InspectionSource::Template(template) => (
                    Some(template.id().clone()),
                    Some(template.title().to_string()),
                    Some(template.category().to_string()).filter(|c| !c.is_empty()),
                    Some(template.description().to_string()).filter(|d| !d.is_empty()),
                    template.sections().to_vec(),
                ),
                InspectionSource::Sections(sections) => (None, None, None, None, sections),
            };

        let id = InspectionId::new();
        let mut inspection = Self {
            id: id.clone(),
            template_id: template_id.clone(),
            title: overrides
                .title
                .or(template_title)
                .unwrap_or_else(|| UNTITLED.to_string()),
            location: overrides
                .location
                .unwrap_or_else(|| defaults.default_location.clone()),
            inspector: overrides.inspector.unwrap_or_default(),
            date: overrides
                .date
                .unwrap_or_else(|| format_now(now, &defaults.date_format, DEFAULT_DATE_FORMAT)),
            time: overrides
                .time
                .unwrap_or_else(|| format_now(now, &defaults.time_format, DEFAULT_TIME_FORMAT)),
            status: InspectionStatus::Pending,
            priority: overrides.priority.unwrap_or_default(),
            sections,
            responses: overrides.responses,
            photos: vec![],
            score: None,
            issues: 0,
            categories: overrides
                .categories
                .unwrap_or_else(|| template_category.into_iter().collect()),
            description: overrides.description.or(template_description),
            created_at: now,
            updated_at: now,
            completed_at: None,
            events: vec![],
        };

        inspection.seed_default_responses(now, defaults);

        let field_count = inspection.field_count();
        inspection.raise_event(DomainEvent::Inspection(InspectionEvent::Materialized {
            inspection_id: id,
            template_id,
            field_count,
        }));
        inspection
    }

    fn seed_default_responses(&mut self, now: DateTime<Utc>, defaults: &MaterializeConfig) {
        let mut seeded = Vec::new();
        for field in self.sections.iter().flat_map(|s| s.fields.iter()) {
            if self.response_value(&field.id).is_some()
                || seeded.iter().any(|r: &Response| r.field_id == field.id)
            {
                continue;
            }
            let header = self.header_value(&field.id).filter(|v| !v.is_empty());
            let value = match &field.kind {
                FieldKind::Text | FieldKind::Date | FieldKind::Time if header.is_some() => {
                    header.map(Value::from)
                }
                FieldKind::Date => {
                    Some(format_now(now, &defaults.date_format, DEFAULT_DATE_FORMAT).into())
                }
                FieldKind::Time => {
                    Some(format_now(now, &defaults.time_format, DEFAULT_TIME_FORMAT).into())
                }
                FieldKind::Number => Some(Value::from(0)),
                // Unanswered booleans have no entry; `false` would read as an answer.
                FieldKind::Boolean => None,
                FieldKind::Text
                | FieldKind::Textarea
                | FieldKind::Select { .. }
                | FieldKind::Image => Some(Value::from("")),
            };
            if let Some(value) = value {
                seeded.push(Response::seeded(field.id.clone(), value, now));
            }
        }
        self.responses.extend(seeded);
    }

    // Header fields of a "General Information" section mirror the inspection header.
    fn header_value(&self, field_id: &str) -> Option<&str> {
        match field_id {
            "title" => Some(&self.title),
            "location" => Some(&self.location),
            "inspector" => Some(&self.inspector),
            "date" => Some(&self.date),
            "time" => Some(&self.time),
            _ => None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &InspectionId { &self.id }
    pub fn template_id(&self) -> Option<&TemplateId> { self.template_id.as_ref() }
    pub fn title(&self) -> &str { &self.title }
    pub fn location(&self) -> &str { &self.location }
    pub fn inspector(&self) -> &str { &self.inspector }
    pub fn date(&self) -> &str { &self.date }
    pub fn time(&self) -> &str { &self.time }
    pub fn status(&self) -> InspectionStatus { self.status }
    pub fn priority(&self) -> InspectionPriority { self.priority }
    pub fn sections(&self) -> &[Section] { &self.sections }
    pub fn responses(&self) -> &[Response] { &self.responses }
    pub fn photos(&self) -> &[String] { &self.photos }
    pub fn score(&self) -> Option<f64> { self.score }
    pub fn issues(&self) -> u32 { self.issues }
    pub fn categories(&self) -> &[String] { &self.categories }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn completed_at(&self) -> Option<DateTime<Utc>> { self.completed_at }

    pub fn is_completed(&self) -> bool {
        self.status == InspectionStatus::Completed
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    /// Malformed fields dropped when this inspection was loaded
    pub fn dropped_fields(&self) -> usize {
        self.sections.iter().map(Section::dropped_fields).sum()
    }

    pub fn response_value(&self, field_id: &str) -> Option<&Value> {
        self.responses
            .iter()
            .find(|r| r.field_id == field_id)
            .map(|r| &r.value)
    }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Upsert an answer. Returns `false` when the inspection is completed
    /// and nothing changed.
    pub fn record_response(&mut self, field_id: impl Into<String>, value: Value) -> bool {
        let field_id = field_id.into();
        if self.is_completed() {
            tracing::debug!(
                inspection = %self.id,
                field = %field_id,
                "Ignoring response on completed inspection"
            );
            return false;
        }

        let response = Response::new(field_id.clone(), value);
        match self.responses.iter_mut().find(|r| r.field_id == field_id) {
            Some(existing) => *existing = response,
            None => self.responses.push(response),
        }
        self.touch();

        self.raise_event(DomainEvent::Inspection(InspectionEvent::ResponseRecorded {
            inspection_id: self.id.clone(),
            field_id,
        }));
        true
    }

    /// `pending` → `in-progress`; a no-op from any other state.
    pub fn begin_work(&mut self) -> bool {
        if self.status != InspectionStatus::Pending {
            return false;
        }
        self.status = InspectionStatus::InProgress;
        self.touch();

        self.raise_event(DomainEvent::Inspection(InspectionEvent::Started {
            inspection_id: self.id.clone(),
            started_at: self.updated_at,
        }));
        true
    }

    /// Completeness first, then value constraints; both in section then
    /// field order. Optional fields still holding their seeded default are
    /// not constraint-checked.
    pub fn validate_for_submit(&self) -> Result<(), SubmitBlock> {
        if let Some(block) = first_incomplete(&self.sections, |id| self.response_value(id)) {
            return Err(block);
        }
        let answered = |field: &Field| {
            self.responses
                .iter()
                .find(|r| r.field_id == field.id)
                .filter(|r| field.required || !r.seeded)
                .map(|r| &r.value)
        };
        match first_invalid(&self.sections, answered) {
            Some(block) => Err(block),
            None => Ok(()),
        }
    }

    pub fn complete(&mut self, findings: Option<Findings>) -> Result<(), InspectionError> {
        if self.is_completed() {
            return Err(InspectionError::AlreadyCompleted(self.id.clone()));
        }
        self.validate_for_submit().map_err(InspectionError::Incomplete)?;

        if let Some(findings) = findings {
            self.issues = findings.issues;
            self.score = findings.score;
        }
        let now = Utc::now();
        self.status = InspectionStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;

        self.raise_event(DomainEvent::Inspection(InspectionEvent::Completed {
            inspection_id: self.id.clone(),
            completed_at: now,
        }));
        Ok(())
    }

    /// Drafts may only be stored while pending, and only once the first
    /// section is filled in.
    pub fn check_draft(&self) -> Result<(), InspectionError> {
        if self.status != InspectionStatus::Pending {
            return Err(InspectionError::NotPending(self.status));
        }
        let Some(first) = self.sections.first() else {
            return Ok(());
        };
        match first_incomplete(std::slice::from_ref(first), |id| self.response_value(id)) {
            Some(block) => Err(InspectionError::Incomplete(block)),
            None => Ok(()),
        }
    }

    pub fn attach_photo(&mut self, uri: impl Into<String>) -> Result<(), InspectionError> {
        if self.is_completed() {
            return Err(InspectionError::AlreadyCompleted(self.id.clone()));
        }
        self.photos.push(uri.into());
        self.touch();
        Ok(())
    }

    pub fn progress(&self) -> InspectionProgress {
        let sections: Vec<SectionProgress> = self
            .sections
            .iter()
            .map(|section| {
                let required: Vec<_> = section.fields.iter().filter(|f| f.required).collect();
                let answered_required = required
                    .iter()
                    .filter(|f| is_complete(f, self.response_value(&f.id)))
                    .count();
                SectionProgress {
                    section_id: section.id.clone(),
                    title: section.title.clone(),
                    required: required.len(),
                    answered_required,
                    complete: answered_required == required.len(),
                }
            })
            .collect();

        let required: usize = sections.iter().map(|s| s.required).sum();
        let answered_required: usize = sections.iter().map(|s| s.answered_required).sum();
        let percent = if required == 0 {
            100
        } else {
            ((answered_required * 100) / required) as u8
        };

        InspectionProgress { sections, required, answered_required, percent }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InspectionError {
    #[error("inspection {0} is already completed")]
    AlreadyCompleted(InspectionId),
    #[error("{0}")]
    Incomplete(SubmitBlock),
    #[error("drafts can only be saved while pending, inspection is {0}")]
    NotPending(InspectionStatus),
}
