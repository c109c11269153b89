#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("scoring error: {0:?}")]
    Scoring(#[from] crate::scoring::ScoringError),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
