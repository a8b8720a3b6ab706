use shared::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
    #[error("packet codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("invalid server address: {0}")]
    Addr(#[from] std::net::AddrParseError),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}
