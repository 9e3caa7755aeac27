//! Error types shared by the synchronization components.

use thiserror::Error;

use super::items::NetworkItemId;

/// Failures surfaced by the synchronization engine.
///
/// None of these are fatal. Every failing operation leaves the progress
/// store untouched and reports a diagnostic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("item id {0} is not in the identifier tables")]
    UnmappedIdentifier(NetworkItemId),

    #[error("no location with id {0} exists in the location table")]
    MissingLocation(NetworkItemId),

    #[error("location {id} is already registered in zone {zone}")]
    DuplicateLocation { id: NetworkItemId, zone: String },

    #[error("death link cooldown is active")]
    CooldownActive,

    #[error("the server refused the connection")]
    ConnectionRefused,

    #[error("could not reach {0}")]
    ConnectTimeout(String),

    #[error("{0} is not obtained")]
    PrerequisiteNotMet(&'static str),

    #[error("unknown behavior: {0}")]
    UnknownBehavior(String),

    #[error("not connected to a session")]
    NotConnected,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures reported by the remote coordination client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote session is closed")]
    Closed,

    #[error("remote rejected the request: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_converts() {
        let err: SyncError = RemoteError::Closed.into();
        assert_eq!(err, SyncError::Remote(RemoteError::Closed));
        assert_eq!(err.to_string(), "remote session is closed");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SyncError::PrerequisiteNotMet("Solar Wind").to_string(),
            "Solar Wind is not obtained"
        );
        assert_eq!(
            SyncError::MissingLocation(42).to_string(),
            "no location with id 42 exists in the location table"
        );
    }
}
