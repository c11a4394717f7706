//! Canonical tag names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Normalized name of the tag that marks a note as trashed.
pub const TRASH_TAG: &str = "TRASH";

/// Canonicalizes raw tag text.
///
/// Applies NFKC (folds full-width and compatibility forms, composes
/// combining sequences), trims surrounding whitespace and uppercases.
/// Empty or whitespace-only input yields an empty string.
///
/// # Examples
///
/// ```
/// use simplynote::domain::normalize_tag_name;
///
/// assert_eq!(normalize_tag_name("  shopping "), "SHOPPING");
/// assert_eq!(normalize_tag_name("ｃａｆé "), "CAFÉ");
/// assert_eq!(normalize_tag_name("   "), "");
/// ```
pub fn normalize_tag_name(raw: &str) -> String {
    let folded: String = raw.nfkc().collect();
    folded.trim().to_uppercase()
}

/// A tag name in canonical form.
///
/// Construction always goes through [`normalize_tag_name`], so two tags that
/// differ only in case, width or surrounding whitespace compare equal.
///
/// # Examples
///
/// ```
/// use simplynote::domain::TagName;
///
/// let tag = TagName::new("urgent").unwrap();
/// assert_eq!(tag.as_str(), "URGENT");
/// assert_eq!(tag, TagName::new(" URGENT").unwrap());
/// assert!(TagName::new("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagName(String);

/// Error returned when tag text normalizes to nothing.
#[derive(Debug, Clone)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl TagName {
    /// Normalizes `raw` and wraps the result.
    ///
    /// # Errors
    ///
    /// Returns `ParseTagError` if the normalized name is empty.
    pub fn new(raw: &str) -> Result<Self, ParseTagError> {
        let normalized = normalize_tag_name(raw);
        if normalized.is_empty() {
            return Err(ParseTagError("tag name required".to_string()));
        }
        Ok(Self(normalized))
    }

    /// The trash marker tag.
    pub fn trash() -> Self {
        Self(TRASH_TAG.to_string())
    }

    /// Returns true if this is the trash marker.
    pub fn is_trash(&self) -> bool {
        self.0 == TRASH_TAG
    }

    /// Returns the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagName(\"{}\")", self.0)
    }
}

impl FromStr for TagName {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TagName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
