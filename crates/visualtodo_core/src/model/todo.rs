//! Todo record model.
//!
//! # Responsibility
//! - Define the persisted record and its JSON wire shape.
//! - Provide the partial-update (`TodoPatch`) merge used by every mutation.
//!
//! # Invariants
//! - `text` is non-empty after trimming and is stored trimmed.
//! - `completed_at.is_some() == completed` for every record that passed
//!   `validate()`, including records decoded from storage.
//! - `id` and `created_at` never change after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Prefix that marks an image value as a raw inline payload.
pub const INLINE_IMAGE_PREFIX: &str = "data:image/";

/// Opaque record identifier.
///
/// New ids are UUID v4 strings. Ids written by older clients (millisecond
/// timestamps) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Generates a fresh collision-resistant id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TodoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Image attached to a record.
///
/// Serialized as a bare string; the variant is recovered from the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    /// Raw `data:image/...;base64,...` payload, not uploaded yet.
    Inline(String),
    /// Retrievable reference, usually a time-limited signed URL.
    Remote(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline(value) | Self::Remote(value) => value.as_str(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        if value.starts_with(INLINE_IMAGE_PREFIX) {
            Self::Inline(value)
        } else {
            Self::Remote(value)
        }
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ImageRef> for String {
    fn from(value: ImageRef) -> Self {
        match value {
            ImageRef::Inline(value) | ImageRef::Remote(value) => value,
        }
    }
}

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    EmptyId,
    EmptyText,
    /// `completed` is true but no completion timestamp is present.
    MissingCompletedAt,
    /// A completion timestamp is present on an open record.
    UnexpectedCompletedAt,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "todo id must not be empty"),
            Self::EmptyText => write!(f, "todo text must not be empty"),
            Self::MissingCompletedAt => {
                write!(f, "completed todo must carry completedAt")
            }
            Self::UnexpectedCompletedAt => {
                write!(f, "completedAt is only allowed on completed todos")
            }
        }
    }
}

impl Error for TodoValidationError {}

/// One to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TodoWire", rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Unvalidated decode target; converted through `Todo::validate()`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoWire {
    id: TodoId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    image: Option<ImageRef>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    category: Option<String>,
}

impl TryFrom<TodoWire> for Todo {
    type Error = TodoValidationError;

    fn try_from(wire: TodoWire) -> Result<Self, Self::Error> {
        let todo = Self {
            id: wire.id,
            text: wire.text,
            completed: wire.completed,
            image: wire.image,
            created_at: wire.created_at,
            completed_at: wire.completed_at,
            category: wire.category,
        };
        todo.validate()?;
        Ok(todo)
    }
}

impl Todo {
    /// Creates an open record with a fresh id, stamped at `now`.
    ///
    /// Returns `EmptyText` when `text` is blank after trimming.
    pub fn new(text: &str, now: DateTime<Utc>) -> Result<Self, TodoValidationError> {
        Self::with_id(TodoId::generate(), text, now)
    }

    /// Creates an open record with a caller-provided id.
    pub fn with_id(
        id: TodoId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, TodoValidationError> {
        let todo = Self {
            id,
            text: text.trim().to_string(),
            completed: false,
            image: None,
            created_at: now,
            completed_at: None,
            category: None,
        };
        todo.validate()?;
        Ok(todo)
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(TodoValidationError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(TodoValidationError::EmptyText);
        }
        match (self.completed, self.completed_at.is_some()) {
            (true, false) => Err(TodoValidationError::MissingCompletedAt),
            (false, true) => Err(TodoValidationError::UnexpectedCompletedAt),
            _ => Ok(()),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Builds the patch that flips completion at `now`.
    pub fn toggle_patch(&self, now: DateTime<Utc>) -> TodoPatch {
        let completed = !self.completed;
        TodoPatch {
            completed: Some(completed),
            completed_at: Some(completed.then_some(now)),
            ..TodoPatch::default()
        }
    }

    /// Merges `patch` into this record.
    ///
    /// Completion fields are normalized afterwards: a record that becomes
    /// completed without a timestamp is stamped with `now`, and a record that
    /// becomes open loses its timestamp.
    pub fn apply_patch(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
        if let Some(text) = patch.text {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                self.text = trimmed.to_string();
            }
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }

        if self.completed && self.completed_at.is_none() {
            self.completed_at = Some(now);
        } else if !self.completed {
            self.completed_at = None;
        }
    }
}

/// Partial update for one record.
///
/// `None` leaves a field untouched; for optional fields `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub image: Option<Option<ImageRef>>,
    pub category: Option<Option<String>>,
}

impl TodoPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn image(image: impl Into<ImageRef>) -> Self {
        Self {
            image: Some(Some(image.into())),
            ..Self::default()
        }
    }

    pub fn clear_image() -> Self {
        Self {
            image: Some(None),
            ..Self::default()
        }
    }

    /// Returns the inline payload carried by this patch, if any.
    pub fn inline_image(&self) -> Option<&str> {
        match &self.image {
            Some(Some(ImageRef::Inline(payload))) => Some(payload.as_str()),
            _ => None,
        }
    }

    /// A patch whose text is present but blank is rejected by mutations.
    pub fn has_blank_text(&self) -> bool {
        self.text
            .as_deref()
            .is_some_and(|text| text.trim().is_empty())
    }
}
