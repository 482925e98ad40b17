use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("gateway error: {0}")]
    Gateway(#[from] ModelError),

    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
