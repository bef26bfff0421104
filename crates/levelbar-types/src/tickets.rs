//! Flat ticket lists grouped into snapshots.
//!
//! Helpdesk exports list tickets one by one, each tagged with the department
//! it belongs to. Grouping turns that into one [`Level`] per department, in
//! the order departments first appear, with the ticket count as the value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::DetailId;
use crate::snapshot::{Detail, Level, Snapshot, SnapshotError};

/// Department used when a ticket does not name one.
pub const UNKNOWN_DEPARTMENT: &str = "(unknown department)";

/// Subject used when a ticket has none.
pub const NO_SUBJECT: &str = "(no subject)";

/// One ticket as exported by the helpdesk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DetailId,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default, rename = "departmenttitle")]
    pub department: Option<String>,

    #[serde(default, rename = "userorganization")]
    pub organization: Option<String>,
}

impl Ticket {
    /// Parse a JSON ticket array and group it.
    ///
    /// Accepts the same `{"error": "..."}` envelope as [`Snapshot::from_json`].
    pub fn snapshot_from_json(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return Err(SnapshotError::Reported(message.to_string()));
        }
        let tickets: Vec<Ticket> = serde_json::from_value(value)?;
        Ok(group_by_department(tickets))
    }
}

/// Group tickets into levels by department.
pub fn group_by_department(tickets: impl IntoIterator<Item = Ticket>) -> Snapshot {
    let mut groups: IndexMap<String, Vec<Detail>> = IndexMap::new();

    for ticket in tickets {
        let department = ticket
            .department
            .unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string());
        groups.entry(department).or_default().push(Detail {
            id: ticket.id,
            subject: ticket.subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
            organization: ticket.organization,
        });
    }

    let levels: Vec<Level> = groups
        .into_iter()
        .map(|(name, details)| Level {
            name,
            value: details.len() as i64,
            details,
        })
        .collect();
    let total = levels.iter().map(|l| l.value).sum();

    Snapshot { total, levels }
}
