//! Recorded field answers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One answered field. An unanswered field has no `Response` at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub field_id: String,
    pub value: Value,
    pub timestamp: DateTime<Utc>,
    /// Filled in at materialization rather than answered
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub seeded: bool,
}

impl Response {
    pub fn new(field_id: impl Into<String>, value: Value) -> Self {
        Self { field_id: field_id.into(), value, timestamp: Utc::now(), seeded: false }
    }

    pub fn seeded(field_id: impl Into<String>, value: Value, at: DateTime<Utc>) -> Self {
        Self { field_id: field_id.into(), value, timestamp: at, seeded: true }
    }
}
