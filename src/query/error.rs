use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("common.invalid.page.number")]
    InvalidPage,

    #[error("common.invalid.limit")]
    InvalidLimit,

    /// A required query or body parameter was absent; carries the message key.
    #[error("{0}")]
    Required(&'static str),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
