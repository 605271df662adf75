//! Typed errors for reading and writing profile files.
//!
//! Parsing never fails: malformed lines are kept as "other" lines and logged.
//! Only the I/O around a file can go wrong.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// A credentials or config file could not be read or written.
    #[error("Profile file I/O failed for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The account-to-profile mapping file could not be read.
    #[error("Mapping file read failed for '{}': {source}", path.display())]
    Mapping {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProfileError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
