//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name used for break laps in place of a category.
pub const BREAK_TAG: &str = "Break";

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The category name collides with the break tag.
    #[error("\"{value}\" is reserved and cannot be used as a category")]
    ReservedCategory { value: String },

    /// Invalid channel value.
    #[error("invalid channel: {value}")]
    InvalidChannel { value: String },
}

/// One of the two mutually exclusive timing tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Study time, labeled with a category when committed.
    Focus,
    /// Rest time, committed without interaction.
    Break,
}

impl Channel {
    /// String representation for display and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Break => "break",
        }
    }

    /// The channel a switch flips to.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(Self::Focus),
            "break" => Ok(Self::Break),
            _ => Err(ValidationError::InvalidChannel {
                value: s.to_string(),
            }),
        }
    }
}

/// A validated focus category (e.g. a subject).
///
/// Categories are trimmed, must be non-empty, and may not be named after the
/// break tag, since break laps use that name in their place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Creates a new category after validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "category" });
        }
        if trimmed.eq_ignore_ascii_case(BREAK_TAG) {
            return Err(ValidationError::ReservedCategory {
                value: trimmed.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the category name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Creation-ordered lap identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LapId(u64);

impl LapId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a lap is filed under: a focus category, or the break tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LapTag {
    Category(Category),
    Break,
}

impl LapTag {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Category(category) => category.as_str(),
            Self::Break => BREAK_TAG,
        }
    }

    /// Returns the category for focus laps.
    #[must_use]
    pub const fn category(&self) -> Option<&Category> {
        match self {
            Self::Category(category) => Some(category),
            Self::Break => None,
        }
    }
}

impl TryFrom<String> for LapTag {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == BREAK_TAG {
            Ok(Self::Break)
        } else {
            Category::new(value).map(Self::Category)
        }
    }
}

impl From<LapTag> for String {
    fn from(tag: LapTag) -> Self {
        match tag {
            LapTag::Category(category) => category.into(),
            LapTag::Break => BREAK_TAG.to_string(),
        }
    }
}

impl fmt::Display for LapTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_trims_and_validates() {
        assert_eq!(Category::new("  Physics ").unwrap().as_str(), "Physics");
        assert_eq!(
            Category::new("   "),
            Err(ValidationError::Empty { field: "category" })
        );
    }

    #[test]
    fn category_rejects_break_tag() {
        assert!(matches!(
            Category::new("break"),
            Err(ValidationError::ReservedCategory { .. })
        ));
    }

    #[test]
    fn channel_flips_and_parses() {
        assert_eq!(Channel::Focus.other(), Channel::Break);
        assert_eq!(Channel::Break.other(), Channel::Focus);
        assert_eq!("break".parse::<Channel>().unwrap(), Channel::Break);
        assert!("nap".parse::<Channel>().is_err());
    }

    #[test]
    fn lap_tag_serializes_as_plain_name() {
        let tag = LapTag::Category(Category::new("Chemistry").unwrap());
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#""Chemistry""#);
        assert_eq!(serde_json::to_string(&LapTag::Break).unwrap(), r#""Break""#);

        let parsed: LapTag = serde_json::from_str(r#""Break""#).unwrap();
        assert_eq!(parsed, LapTag::Break);
        assert!(serde_json::from_str::<LapTag>(r#""""#).is_err());
    }
}
