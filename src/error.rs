use crate::session::SessionState;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
