use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("ABI decoding failed: {0}")]
    Abi(String),

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChainError::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ChainError::Transport(format!("connection failed: {e}"))
        } else {
            ChainError::Transport(e.to_string())
        }
    }
}
