use thiserror::Error;

/// Errors surfaced by the planner. Every variant carries a message naming
/// the offending field or entity.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// A referenced user, recipe, ingredient, meal-plan entry or
    /// shopping-list entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The mutation would violate a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// A required field is missing or an enum value is out of range.
    #[error("{0}")]
    Validation(String),

    /// The underlying store failed.
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PlannerError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
