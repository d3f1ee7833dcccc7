//! Error types for the guard crate.

use thiserror::Error;

/// Reasons a SQL text is refused by the guard.
///
/// Every variant is client-caused and must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// The text is not valid SQL in the gateway dialect.
    #[error("SQL parse error: {0}")]
    Parse(String),

    /// The text contains no statement at all.
    #[error("SQL parse error: empty statement")]
    Empty,

    /// More than one statement was submitted.
    #[error("Only SELECT statements are allowed")]
    MultipleStatements { count: usize },

    /// The statement can change state, or is not a query.
    #[error("Only SELECT statements are allowed")]
    NotReadOnly { reason: String },
}
