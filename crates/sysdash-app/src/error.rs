//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] sysdash_ws::WsError),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type AppResult<T> = Result<T, AppError>;
