/// Error taxonomy for the progress subsystem.
///
/// The HTTP layer that embeds this crate maps `NotFound` to 404,
/// `Validation` to 400 and `Storage` to 500.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("no progress recorded for user {user_id} in course {course_id}")]
    NotFound { user_id: String, course_id: String },
    #[error("invalid progress payload: {0}")]
    Validation(String),
    #[error("progress store failure: {0}")]
    Storage(anyhow::Error),
}

impl From<sqlx::Error> for ProgressError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl From<serde_json::Error> for ProgressError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.into())
    }
}
