//! Error taxonomy for archive storage operations

/// Errors surfaced by the archive storage layer
///
/// Validation failures are raised before any I/O is attempted. Transport
/// failures are propagated from the underlying stores unchanged; this layer
/// never retries.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Malformed input (bad URL scheme, wrong record shape, empty identifier)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced blob or metadata record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The underlying store was unreachable or failed at the protocol level
    #[error("Transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl ArchiveError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<anyhow::Error> for ArchiveError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<rusqlite_migration::Error> for ArchiveError {
    fn from(err: rusqlite_migration::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.into())
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(err.into())
    }
}

/// Result alias used throughout the archive crate
pub type Result<T> = std::result::Result<T, ArchiveError>;
