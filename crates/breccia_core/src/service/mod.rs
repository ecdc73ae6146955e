//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the view layer decoupled from storage details.

use serde::Serialize;

pub mod activity_service;
pub mod answer_set_service;
pub mod map;
pub mod person_service;
pub mod profile_service;
pub mod relationship_service;

/// One user-facing validation message bound to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
