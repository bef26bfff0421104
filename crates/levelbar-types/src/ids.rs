//! Detail identifiers.
//!
//! Data sources emit ids either as JSON strings (`"12345"`) or as JSON numbers
//! (`12345`). The id is never interpreted: it is carried verbatim and only
//! embedded into resource links, so `Display` reproduces the source text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a detail record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailId {
    /// Identifier sent as a JSON string.
    Text(String),
    /// Identifier sent as a JSON number, kept in its JSON rendering.
    Number(serde_json::Number),
}

impl fmt::Display for DetailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailId::Text(text) => f.write_str(text),
            DetailId::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for DetailId {
    fn from(text: &str) -> Self {
        DetailId::Text(text.to_string())
    }
}

impl From<String> for DetailId {
    fn from(text: String) -> Self {
        DetailId::Text(text)
    }
}

impl From<u64> for DetailId {
    fn from(number: u64) -> Self {
        DetailId::Number(number.into())
    }
}

impl From<i64> for DetailId {
    fn from(number: i64) -> Self {
        DetailId::Number(number.into())
    }
}
