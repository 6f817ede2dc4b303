//! Outage schedule data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `line: window` entry extracted from the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutageRecord {
    /// Queue/line identifier, e.g. `5.2`
    pub line_id: String,

    /// Either the always-on marker or a time window such as `19:00-20:30`
    pub description: String,
}

impl OutageRecord {
    pub fn new(line_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            line_id: line_id.into(),
            description: description.into(),
        }
    }

    /// Canonical single-line form used for fingerprinting.
    pub fn canonical(&self) -> String {
        format!("{}: {}", self.line_id, self.description)
    }
}

/// All records found on one fetch of the source page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSnapshot {
    pub records: Vec<OutageRecord>,

    /// Identifier of the article the records came from (article mode only)
    pub article_id: Option<String>,

    /// Article heading text (article mode only)
    pub heading: Option<String>,
}

impl ScheduleSnapshot {
    pub fn new(records: Vec<OutageRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Opaque value identifying a snapshot's content.
///
/// Equal tokens mean "nothing changed since the last notification".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeToken(String);

impl ChangeToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChangeToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}
