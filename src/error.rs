use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError
{
    #[error("Unknown game '{0}'. Run with --help.")]
    UnknownGame(String),

    #[error("No game is running")]
    NotRunning,

    #[error("No game selected to replay")]
    NoActiveGame,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HubError>;
