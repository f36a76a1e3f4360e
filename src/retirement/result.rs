use std::fmt;

use serde::Serialize;

use crate::error::CollaboratorError;

/// One entity the pipeline could not retire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetirementFailure {
    pub entity_id: String,
    #[serde(serialize_with = "error_as_string")]
    pub error: CollaboratorError,
}

impl RetirementFailure {
    pub fn new(entity_id: impl Into<String>, error: CollaboratorError) -> Self {
        RetirementFailure {
            entity_id: entity_id.into(),
            error,
        }
    }
}

fn error_as_string<S: serde::Serializer>(
    error: &CollaboratorError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationRetirementResult {
    pub deleted_count: usize,
    pub deleted_ids: Vec<String>,
    pub errors: Vec<RetirementFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetirementResult {
    pub deleted_count: usize,
    pub deleted_ids: Vec<String>,
    pub deleted_conversations_count: usize,
    pub deleted_images_count: usize,
    pub errors: Vec<RetirementFailure>,
}

impl RetirementResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for RetirementResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listings deleted, {} conversations, {} images, {} errors",
            self.deleted_count,
            self.deleted_conversations_count,
            self.deleted_images_count,
            self.errors.len()
        )
    }
}
