use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Field-level input error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("recipe not found: {}", join_ids(.ids))]
    RecipeNotFound { ids: Vec<Uuid> },

    #[error("a vegetarian menu cannot contain non-vegetarian recipes")]
    VegetarianConflict,

    #[error("recipe lookup failed: {0}")]
    Resolver(#[source] anyhow::Error),
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
