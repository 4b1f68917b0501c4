use crate::document::DocumentError;
use crate::editor::SessionError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
