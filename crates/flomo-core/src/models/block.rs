//! Block model
//!
//! Blocks are the nodes of the target document store: an ordered tree where
//! every node may carry text or media, typed properties, and tag references.
//! Tags are blocks too; a tag reference additionally carries per-instance
//! property values, which is where imported notes keep their external `ID`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::FileKind;

/// Identifier of a block in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub i64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-local reference to an uploaded binary asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a block renders as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockContent {
    Text { text: String },
    Image { src: AssetRef },
    Audio { src: AssetRef },
}

impl BlockContent {
    /// Plain text content
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Media content for an attached file.
    ///
    /// Anything that is not an image is rendered with the audio player.
    #[must_use]
    pub fn media(kind: FileKind, src: AssetRef) -> Self {
        match kind {
            FileKind::Image => Self::Image { src },
            FileKind::Audio | FileKind::Other => Self::Audio { src },
        }
    }

    /// Storage discriminator
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
        }
    }

    /// Text payload or media source, whichever the variant holds
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::Image { src } | Self::Audio { src } => src.as_str(),
        }
    }

    /// Rebuild content from its storage discriminator and value
    pub fn from_parts(kind: &str, value: String) -> Result<Self> {
        match kind {
            "text" => Ok(Self::Text { text: value }),
            "image" => Ok(Self::Image {
                src: AssetRef::new(value),
            }),
            "audio" => Ok(Self::Audio {
                src: AssetRef::new(value),
            }),
            other => Err(Error::Store(format!("unknown block kind `{other}`"))),
        }
    }
}

/// Where a new block goes relative to its parent's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    FirstChild,
    LastChild,
}

/// Type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Text,
    /// Opaque external identifier, compared by exact string match
    Identifier,
    Number,
}

impl PropertyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Identifier => "identifier",
            Self::Number => "number",
        }
    }
}

impl FromStr for PropertyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "identifier" => Ok(Self::Identifier),
            "number" => Ok(Self::Number),
            other => Err(Error::Store(format!("unknown property type `{other}`"))),
        }
    }
}

/// A named, typed property; `value` is `None` for a bare declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: PropertyType,
    pub value: Option<String>,
}

impl Property {
    /// Identifier property carrying a value
    #[must_use]
    pub fn identifier(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyType::Identifier,
            value: Some(value.into()),
        }
    }

    /// Property declaration without a value
    #[must_use]
    pub fn declaration(name: impl Into<String>, kind: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
        }
    }
}

/// Insert or replace `incoming` properties by name, keeping existing order
pub fn merge_properties(target: &mut Vec<Property>, incoming: &[Property]) {
    for property in incoming {
        if let Some(existing) = target.iter_mut().find(|p| p.name == property.name) {
            *existing = property.clone();
        } else {
            target.push(property.clone());
        }
    }
}

/// A tag applied to a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// The tag's own block
    pub tag: BlockId,
    /// Tag name (the tag block's text)
    pub name: String,
    /// Per-instance property values
    pub data: Vec<Property>,
}

impl TagRef {
    /// Value of the named instance property, if set
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

/// Explicit creation/modification instants for a new block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub parent: Option<BlockId>,
    pub content: BlockContent,
    pub children: Vec<BlockId>,
    pub properties: Vec<Property>,
    pub tags: Vec<TagRef>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Block {
    /// Text of a text block; media blocks have none
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Text { text } => Some(text),
            BlockContent::Image { .. } | BlockContent::Audio { .. } => None,
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&TagRef> {
        self.tags.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_media_defaults_to_audio() {
        let src = AssetRef::new("assets/x.bin");
        assert_eq!(
            BlockContent::media(FileKind::Image, src.clone()).kind(),
            "image"
        );
        assert_eq!(
            BlockContent::media(FileKind::Audio, src.clone()).kind(),
            "audio"
        );
        assert_eq!(BlockContent::media(FileKind::Other, src).kind(), "audio");
    }

    #[test]
    fn test_content_parts_round_trip_kind() {
        let content = BlockContent::from_parts("image", "assets/a.png".to_string()).unwrap();
        assert_eq!(content.value(), "assets/a.png");
        assert!(BlockContent::from_parts("video", String::new()).is_err());
    }

    #[test]
    fn test_merge_properties_replaces_by_name() {
        let mut properties = vec![
            Property::declaration("ID", PropertyType::Identifier),
            Property::identifier("Other", "1"),
        ];
        merge_properties(
            &mut properties,
            &[Property::identifier("ID", "9"), Property::identifier("New", "x")],
        );

        assert_eq!(
            properties,
            vec![
                Property::identifier("ID", "9"),
                Property::identifier("Other", "1"),
                Property::identifier("New", "x"),
            ]
        );
    }

    #[test]
    fn test_tag_ref_value_of() {
        let tag = TagRef {
            tag: BlockId(3),
            name: "Flomo Note".to_string(),
            data: vec![
                Property::identifier("ID", "42"),
                Property::declaration("Empty", PropertyType::Text),
            ],
        };
        assert_eq!(tag.value_of("ID"), Some("42"));
        assert_eq!(tag.value_of("Empty"), None);
        assert_eq!(tag.value_of("Missing"), None);
    }
}
