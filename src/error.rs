use std::{io, path::PathBuf};

/// Fatal errors. Anything that should only warn the user is logged instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Given url `{0}` doesn't match HTTP(s) url pattern")]
    InvalidUrl(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTTP request cannot contain `--data`, `--json` & `--file` arguments simultaneously")]
    ConflictingBodyArguments,

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Read error: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Errors caused by how the command was invoked rather than by I/O.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::InvalidArgument(_) | Error::ConflictingBodyArguments
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
