use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("source file is missing required column '{column}'")]
    MissingColumn { column: String },
    #[error("line {line}: found {found} fields, but the header has {expected}")]
    ExtraFields {
        line: u64,
        found: usize,
        expected: usize,
    },
    #[error("line {line}: cannot read '{value}' as {column}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("database connection error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("database write error: {0}")]
    Write(#[source] sqlx::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`ImportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    File,
    Connection,
    Write,
    Config,
}

impl ImportError {
    pub fn file(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        ImportError::File {
            path: path.into(),
            source,
        }
    }

    /// Which stage of the run failed. Schema and value problems are
    /// attributed to the source file.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::File { .. }
            | ImportError::MissingColumn { .. }
            | ImportError::ExtraFields { .. }
            | ImportError::InvalidValue { .. } => ErrorKind::File,
            ImportError::Connection(_) => ErrorKind::Connection,
            ImportError::Write(_) => ErrorKind::Write,
            ImportError::Config(_) => ErrorKind::Config,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::File => "file",
            ErrorKind::Connection => "connection",
            ErrorKind::Write => "write",
            ErrorKind::Config => "config",
        };
        f.write_str(label)
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
