use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The underlying settings store failed.
    #[error("Archive storage error: {0}")]
    Storage(#[from] bridge_traits::BridgeError),

    /// A stored blob exists but could not be parsed.
    #[error("Corrupt archive blob under '{key}': {message}")]
    Corrupt { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
