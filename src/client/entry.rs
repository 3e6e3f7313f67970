use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::messages::{Document, Timestamp};
use crate::common::sanitize::{name_from_value, score_from_value};

/// One row of the leaderboard as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    /// Server write time, or the Unix epoch when the stored value is unusable
    pub created_at: DateTime<Utc>,
}

impl ScoreEntry {
    /// Normalize a raw stored document. Never fails: bad fields fall back to defaults.
    pub fn from_document(doc: &Document) -> Self {
        let created_at = doc
            .get("createdAt")
            .and_then(Timestamp::from_value)
            .and_then(Timestamp::to_datetime)
            .unwrap_or_default();

        Self {
            name: name_from_value(doc.get("name")),
            score: score_from_value(doc.get("score")),
            created_at,
        }
    }
}
