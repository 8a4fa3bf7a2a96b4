//! Chapter identity and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when constructing a [`ChapterId`] from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chapter id must not be empty")]
pub struct InvalidChapterId;

/// Stable identifier of a chapter within a reading session.
///
/// Smart constructor guarantees the id is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChapterId(String);

impl ChapterId {
    /// Create a chapter id, rejecting empty or whitespace-only strings.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidChapterId> {
        let id = id.into();
        if id.trim().is_empty() {
            Err(InvalidChapterId)
        } else {
            Ok(Self(id))
        }
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChapterId {
    type Error = InvalidChapterId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChapterId> for String {
    fn from(id: ChapterId) -> Self {
        id.0
    }
}

/// A named, ordered span of a larger document.
///
/// Immutable once handed to the engine. The engine shares the chapter list
/// between renderers and never copies individual chapters into its caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Identifier, unique within the session.
    pub id: ChapterId,
    /// Display title, laid out as the chapter heading.
    pub title: String,
    /// Position of the chapter in reading order.
    pub order: usize,
    /// Character count, when known up front. Drives height estimation.
    #[serde(default)]
    pub char_length: Option<usize>,
    /// Opaque reference resolved by the text source.
    #[serde(default)]
    pub source_ref: Option<String>,
}

impl Chapter {
    /// Create a chapter without length or source reference.
    pub fn new(id: ChapterId, title: impl Into<String>, order: usize) -> Self {
        Self {
            id,
            title: title.into(),
            order,
            char_length: None,
            source_ref: None,
        }
    }

    /// Attach a known character count.
    pub fn with_char_length(mut self, char_length: usize) -> Self {
        self.char_length = Some(char_length);
        self
    }

    /// Attach an opaque source reference.
    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }
}

/// Sort chapters into reading order. Stable for equal `order` values.
pub fn into_reading_order(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
    chapters.sort_by_key(|chapter| chapter.order);
    chapters
}
