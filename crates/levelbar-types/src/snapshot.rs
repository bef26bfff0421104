//! Snapshot, level and detail records.
//!
//! The JSON shape produced by data sources:
//!
//! ```json
//! {
//!   "total": 5,
//!   "levels": [
//!     { "level": "Open", "value": 5,
//!       "details": [ { "id": 1, "subject": "Printer jam" } ] }
//!   ]
//! }
//! ```
//!
//! `total` and `levels` are optional (absent or `null` read as `0` / `[]`),
//! as is a level's `details`. Sources that fail report `{"error": "..."}`
//! instead, which parses as [`SnapshotError::Reported`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::DetailId;
use crate::tickets::NO_SUBJECT;

/// Errors from parsing source output into a [`Snapshot`].
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot JSON is not an object")]
    NotAnObject,

    #[error("source reported an error: {0}")]
    Reported(String),
}

/// One fetched state: aggregate total plus ordered levels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate count shown in the top label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: i64,

    /// Levels in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub levels: Vec<Level>,
}

/// A named category with a count and its detail records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    #[serde(rename = "level")]
    pub name: String,

    pub value: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<Detail>,
}

/// A leaf record referencing an external resource by id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub id: DetailId,

    /// Full subject line. Display code truncates a copy, never this value.
    /// Absent or `null` reads as [`NO_SUBJECT`].
    #[serde(default = "no_subject", deserialize_with = "subject_or_placeholder")]
    pub subject: String,

    /// Customer organization, when the source knows it.
    #[serde(
        default,
        rename = "userorganization",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization: Option<String>,
}

impl Snapshot {
    /// The zero snapshot substituted for every failed fetch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from parts.
    pub fn new(total: i64, levels: Vec<Level>) -> Self {
        Self { total, levels }
    }

    /// Parse raw source output.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        let serde_json::Value::Object(map) = &value else {
            return Err(SnapshotError::NotAnObject);
        };

        // Error envelope from the data script: {"error": "..."}
        if !map.contains_key("levels") {
            if let Some(message) = map.get("error").and_then(|e| e.as_str()) {
                return Err(SnapshotError::Reported(message.to_string()));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// True for the zero snapshot and any snapshot with no levels and no total.
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.levels.is_empty()
    }

    /// Total number of detail records across all levels.
    pub fn detail_count(&self) -> usize {
        self.levels.iter().map(|l| l.details.len()).sum()
    }
}

impl Level {
    /// Create a level with no details.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
            details: Vec::new(),
        }
    }

    /// Append a detail record.
    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.details.push(detail);
        self
    }
}

impl Detail {
    /// Create a detail with no organization.
    pub fn new(id: impl Into<DetailId>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            organization: None,
        }
    }

    /// Set the customer organization.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Treat an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn no_subject() -> String {
    NO_SUBJECT.to_string()
}

fn subject_or_placeholder<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(no_subject))
}
