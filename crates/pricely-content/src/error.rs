use thiserror::Error;

/// Errors surfaced by the Content CRUD interface (§4.8) and the session
/// services built on top of it (§4.7).
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content store error: {reason}")]
    Store { reason: String },

    #[error("record not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("unknown table {0:?}")]
    UnknownTable(String),
}

impl From<sqlx::Error> for ContentError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ContentError::NotFound,
            other => ContentError::Store { reason: other.to_string() },
        }
    }
}
