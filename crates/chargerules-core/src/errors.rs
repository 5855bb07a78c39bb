use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("store error: {0}")]
    Store(String),
    #[error("snapshot io: {0}")]
    Snapshot(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
