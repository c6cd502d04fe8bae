use crate::matcher::MatchError;
use crate::scheme::SchemeError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scheme(#[from] SchemeError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("no color scheme is loaded")]
    NoScheme,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
