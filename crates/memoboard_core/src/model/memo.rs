//! Memo domain model.
//!
//! # Responsibility
//! - Define the canonical memo card record shared by store, sync and display.
//! - Provide lifecycle helpers for soft-delete (trash) semantics.
//!
//! # Invariants
//! - `id` is stable and never reused for another memo.
//! - `is_deleted` is the source of truth for trash state.
//! - `updated_at` is stamped by the backend and acts as the record version.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of one memo.
pub type MemoId = Uuid;

/// Identifier of the user owning a memo.
pub type OwnerId = Uuid;

const UNTITLED: &str = "Untitled";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Pastel card color.
///
/// The six palette entries are listed in hue order, which is also the color
/// sort order. Values outside the palette survive as `Other` so records written
/// by older clients still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemoColor {
    Red,
    Orange,
    #[default]
    Yellow,
    Green,
    Blue,
    Purple,
    /// Any non-palette value, kept verbatim.
    Other(String),
}

impl MemoColor {
    /// Palette in hue order.
    pub fn palette() -> [MemoColor; 6] {
        [
            Self::Red,
            Self::Orange,
            Self::Yellow,
            Self::Green,
            Self::Blue,
            Self::Purple,
        ]
    }

    /// Stored hex value.
    pub fn hex(&self) -> &str {
        match self {
            Self::Red => "#FFB3BA",
            Self::Orange => "#FFD4B3",
            Self::Yellow => "#FFF5B3",
            Self::Green => "#BAFFC9",
            Self::Blue => "#BAE1FF",
            Self::Purple => "#E6BAFF",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Short palette name, `None` for non-palette values.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Red => Some("red"),
            Self::Orange => Some("orange"),
            Self::Yellow => Some("yellow"),
            Self::Green => Some("green"),
            Self::Blue => Some("blue"),
            Self::Purple => Some("purple"),
            Self::Other(_) => None,
        }
    }

    /// Position in the hue-ordered priority table, `None` for unknown colors.
    pub fn priority(&self) -> Option<u8> {
        match self {
            Self::Red => Some(0),
            Self::Orange => Some(1),
            Self::Yellow => Some(2),
            Self::Green => Some(3),
            Self::Blue => Some(4),
            Self::Purple => Some(5),
            Self::Other(_) => None,
        }
    }

    /// Returns whether this value may be written to storage.
    ///
    /// Palette colors always pass; other values must be `#RRGGBB`.
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Other(value) => HEX_COLOR_RE.is_match(value),
            _ => true,
        }
    }

    fn from_hex(value: &str) -> Option<Self> {
        Self::palette()
            .into_iter()
            .find(|color| color.hex().eq_ignore_ascii_case(value))
    }
}

impl From<String> for MemoColor {
    fn from(value: String) -> Self {
        Self::from_hex(value.trim()).unwrap_or(Self::Other(value))
    }
}

impl From<MemoColor> for String {
    fn from(value: MemoColor) -> Self {
        match value {
            MemoColor::Other(raw) => raw,
            known => known.hex().to_string(),
        }
    }
}

impl Display for MemoColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.hex()),
        }
    }
}

impl FromStr for MemoColor {
    type Err = MemoValidationError;

    /// Accepts palette names (`red`) or hex values (`#FFB3BA`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(color) = Self::palette()
            .into_iter()
            .find(|color| color.name().is_some_and(|name| name.eq_ignore_ascii_case(trimmed)))
        {
            return Ok(color);
        }
        if let Some(color) = Self::from_hex(trimmed) {
            return Ok(color);
        }
        if HEX_COLOR_RE.is_match(trimmed) {
            return Ok(Self::Other(trimmed.to_ascii_uppercase()));
        }
        Err(MemoValidationError::InvalidColor(trimmed.to_string()))
    }
}

/// Validation failures for memo writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    /// Both title and content are blank.
    EmptyMemo,
    /// Color is neither a palette entry nor a `#RRGGBB` value.
    InvalidColor(String),
    /// Position must be zero or greater.
    NegativePosition(i64),
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMemo => write!(f, "memo needs a title or content"),
            Self::InvalidColor(value) => write!(f, "invalid memo color `{value}`"),
            Self::NegativePosition(value) => write!(f, "memo position must be >= 0, got {value}"),
        }
    }
}

impl Error for MemoValidationError {}

/// One memo card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: MemoId,
    /// Serialized as `user_id` to match the backend collection schema.
    #[serde(rename = "user_id")]
    pub owner: OwnerId,
    pub title: String,
    pub content: String,
    pub color: MemoColor,
    /// Dense manual ordering key among the owner's active memos.
    pub position: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Newer wins during reconciliation.
    pub updated_at: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Memo {
    /// Creates a memo with a client-generated id.
    ///
    /// Timestamps are set to the local clock; the backend overwrites them on
    /// insert.
    pub fn new(
        owner: OwnerId,
        title: impl Into<String>,
        content: impl Into<String>,
        color: MemoColor,
        position: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            content: content.into(),
            color,
            position,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    /// Title for display, with a placeholder for untitled memos.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            self.title.as_str()
        }
    }

    /// Case-insensitive substring match over title and content.
    ///
    /// An empty query matches every memo.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }

    /// Moves this memo to the trash.
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Takes this memo back out of the trash.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Applies every field set in `patch`.
    pub fn apply_patch(&mut self, patch: &MemoPatch) {
        if let Some(title) = patch.title.as_ref() {
            self.title = title.clone();
        }
        if let Some(content) = patch.content.as_ref() {
            self.content = content.clone();
        }
        if let Some(color) = patch.color.as_ref() {
            self.color = color.clone();
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(is_deleted) = patch.is_deleted {
            self.is_deleted = is_deleted;
        }
    }

    /// Validates write invariants.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        if self.title.trim().is_empty() && self.content.trim().is_empty() {
            return Err(MemoValidationError::EmptyMemo);
        }
        if !self.color.is_writable() {
            return Err(MemoValidationError::InvalidColor(self.color.hex().to_string()));
        }
        if self.position < 0 {
            return Err(MemoValidationError::NegativePosition(self.position));
        }
        Ok(())
    }
}

/// Partial update for one memo. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MemoColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl MemoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.color.is_none()
            && self.position.is_none()
            && self.is_deleted.is_none()
    }

    pub fn trashed(is_deleted: bool) -> Self {
        Self {
            is_deleted: Some(is_deleted),
            ..Self::default()
        }
    }
}

/// One `(id, position)` pair persisted after a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: MemoId,
    pub position: i64,
}
