//! Failures raised while relating types.

use thiserror::Error;

/// A relation query that could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    /// A recursion ceiling was reached.
    #[error("undecidable {operation}: recursion limit exceeded")]
    Undecidable { operation: &'static str },

    /// A type parameter without a default had no argument.
    #[error("missing type argument for {parameter} of {declaration}")]
    MissingTypeArgument {
        parameter: String,
        declaration: String,
    },
}

impl RelationError {
    pub fn undecidable(operation: &'static str) -> Self {
        RelationError::Undecidable { operation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationIssueKind {
    Undecidable,
    MissingTypeArgument,
}

/// A recovered failure, drained by the phase that issued the query and
/// turned into a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationIssue {
    pub kind: RelationIssueKind,
    pub message: String,
}

impl From<&RelationError> for RelationIssue {
    fn from(error: &RelationError) -> Self {
        let kind = match error {
            RelationError::Undecidable { .. } => RelationIssueKind::Undecidable,
            RelationError::MissingTypeArgument { .. } => RelationIssueKind::MissingTypeArgument,
        };
        RelationIssue {
            kind,
            message: error.to_string(),
        }
    }
}

pub type RelationResult<T> = Result<T, RelationError>;
