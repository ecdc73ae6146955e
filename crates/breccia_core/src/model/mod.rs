//! Domain model for people, relationships, survey answers and activities.
//!
//! # Invariants
//! - Every persisted record is identified by a positive integer primary key.
//! - An owner (person or relationship) has at most one current answer set.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod activity;
pub mod answer_set;
pub mod person;
pub mod question;
pub mod relationship;

/// Maximum length for free-text names.
pub const MAX_NAME_CHARS: usize = 255;

/// Validation failures raised before any write reaches storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace.
    Blank(&'static str),
    /// A text field exceeds [`MAX_NAME_CHARS`].
    TooLong { field: &'static str, max_chars: usize },
    /// A relationship points from a person to themselves.
    SelfRelationship,
    /// An activity ends before it starts.
    EndsBeforeStart,
    /// A coordinate is outside its valid range.
    CoordinateOutOfRange { field: &'static str, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(field) => write!(f, "{field} cannot be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} cannot exceed {max_chars} characters")
            }
            Self::SelfRelationship => write!(f, "a person cannot have a relationship with themselves"),
            Self::EndsBeforeStart => write!(f, "end time must not be earlier than start time"),
            Self::CoordinateOutOfRange { field, value } => {
                write!(f, "{field} value {value} is out of range")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max_chars: MAX_NAME_CHARS,
        });
    }
    Ok(())
}
