//! Chapter document model.
//!
//! A [`Chapter`] is stored as one document: its [`Subsection`]s and their
//! [`Finding`]s have no identity of their own and are always written and
//! read together with the parent.
//!
//! Client payloads arrive as [`ChapterInput`], which is turned into the
//! persisted [`ChapterDocument`] by [`ChapterInput::normalize`]. Field names
//! on the wire are camelCase (`chapterTitle`, `subsectionTitle`, ...), with
//! the image reference spelled `imageURL`. An explicit `null` decodes the
//! same as a missing field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Storage-generated chapter identity.
///
/// Serialized as the hyphenated UUID string. Clients never choose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(Uuid);

impl ChapterId {
    /// Generate a fresh identity. Only store backends call this.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ChapterId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Leaf content item within a subsection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Finding {
    #[serde(deserialize_with = "null_as_default")]
    pub finding_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub supporting_authors: Vec<String>,
}

/// Ordered grouping of findings within a chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subsection {
    #[serde(deserialize_with = "null_as_default")]
    pub subsection_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub findings: Vec<Finding>,
}

/// Chapter payload as sent by clients on create and update.
///
/// Every field may be omitted. An `id` in the body is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChapterInput {
    #[serde(deserialize_with = "null_as_default")]
    pub chapter_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subsections: Vec<Subsection>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
}

impl ChapterInput {
    /// Produce the document that gets persisted.
    ///
    /// Missing tags become an empty list; stored documents never carry a
    /// null `tags`.
    pub fn normalize(self) -> ChapterDocument {
        ChapterDocument {
            chapter_title: self.chapter_title,
            subsections: self.subsections,
            tags: self.tags.unwrap_or_default(),
            image_url: self.image_url,
        }
    }
}

/// Normalized chapter body, exactly as persisted (without the id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChapterDocument {
    pub chapter_title: String,
    pub subsections: Vec<Subsection>,
    pub tags: Vec<String>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A stored chapter: identity plus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(flatten)]
    pub document: ChapterDocument,
}

/// Acknowledgment returned by chapter creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertAck {
    #[serde(rename = "InsertedID")]
    pub inserted_id: ChapterId,
}
