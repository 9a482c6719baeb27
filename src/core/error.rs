use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage failure")]
    Storage,

    #[error("scheduler is not running")]
    SchedulerUnavailable,
}

impl From<()> for AppError {
    fn from(_: ()) -> Self {
        // Repositories log the underlying cause before handing back `()`.
        AppError::Storage
    }
}
