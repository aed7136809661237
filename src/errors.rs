use thiserror::Error;

/// Errors surfaced by navigation, listing, and open operations.
///
/// Everything here is recoverable: the command dispatcher catches these at
/// its boundary, reports them, and leaves the current location untouched.
/// Only `Config` aborts, and only during startup.
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("unreadable archive {0}: {1}")]
    UnreadableArchive(String, String),

    #[error("unsupported archive feature in {0}: {1}")]
    UnsupportedFormat(String, String),

    #[error("member {member} not found in {archive}")]
    MemberNotFound { archive: String, member: String },

    #[error("{archive} requires a password")]
    PasswordRequired { archive: String },

    #[error("cannot decode {0} as text: {1}")]
    Decode(String, String),

    #[error("no handler configured for {0}")]
    NoHandler(String),

    #[error("failed to launch handler for {0}: {1}")]
    Launch(String, String),

    #[error("stale reference: {0}")]
    BrokenReference(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BrowseResult<T> = Result<T, BrowseError>;

impl BrowseError {
    /// Map an I/O error on a named path to the browse taxonomy.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => BrowseError::NotFound(path.to_string()),
            ErrorKind::PermissionDenied => BrowseError::AccessDenied(path.to_string()),
            _ => BrowseError::Io(err),
        }
    }
}
