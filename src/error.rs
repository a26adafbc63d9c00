use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or understand a subtitle file. Always fatal to an import.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read subtitle file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported subtitle format for {0} (expected .srt or .vtt)")]
    UnsupportedFormat(PathBuf),

    #[error("Missing WEBVTT header")]
    MissingHeader,

    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl ParseError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Video {0} does not exist")]
    VideoNotFound(i64),

    #[error("Failed to prepare database location {path}: {source}")]
    Location {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Player '{0}' was not found on PATH")]
    PlayerNotFound(String),

    #[error("Player '{program}' failed: {source}")]
    Failed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to hand the terminal over to the player: {0}")]
    Terminal(#[source] std::io::Error),
}

/// Fatal failures of a single import run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("File {path} is not accessible: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
