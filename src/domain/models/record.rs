//! Transcript record domain model.
//!
//! A record is one utterance: who spoke, when, and what was said.
//! Two records with the same (speaker, timestamp) pair are the same logical
//! utterance observed at different stages of rendering.

use serde::{Deserialize, Serialize};

/// A record exactly as the snapshot source observed it.
///
/// Any field may be missing or empty; validation happens once in
/// [`Record::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default, alias = "time")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl RawRecord {
    /// Convenience constructor for fully populated raw records.
    pub fn new(
        speaker: impl Into<String>,
        timestamp: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            speaker: Some(speaker.into()),
            timestamp: Some(timestamp.into()),
            content: Some(content.into()),
        }
    }
}

/// Identity of a logical utterance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub speaker: String,
    pub timestamp: String,
}

/// A validated transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub speaker: String,
    /// Opaque, lexicographically ordered timestamp as rendered by the view
    #[serde(rename = "time", alias = "timestamp")]
    pub timestamp: String,
    pub content: String,
}

impl Record {
    /// Build a record without validation. Untrusted input goes through
    /// [`Record::from_raw`].
    pub fn new(
        speaker: impl Into<String>,
        timestamp: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            timestamp: timestamp.into(),
            content: content.into(),
        }
    }

    /// Validate a raw observation.
    ///
    /// Returns `None` when speaker, timestamp or content is missing or blank.
    pub fn from_raw(raw: RawRecord) -> Option<Self> {
        let speaker = non_blank(raw.speaker)?;
        let timestamp = non_blank(raw.timestamp)?;
        let content = non_blank(raw.content)?;
        Some(Self {
            speaker,
            timestamp,
            content,
        })
    }

    /// The (speaker, timestamp) identity of this record.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            speaker: self.speaker.clone(),
            timestamp: self.timestamp.clone(),
        }
    }

    /// Content length in characters, the measure of how complete a record is.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Whether `candidate` carries more information than `self` and should
    /// replace it. Only strictly longer content wins.
    pub fn should_replace(&self, candidate: &Self) -> bool {
        candidate.content_len() > self.content_len()
    }
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}
