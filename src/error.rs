//! Error types for dataset decoding and verification

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which byte source a read came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The client file (dimensions, r, s)
    Client,
    /// The dataset file (matrix entries)
    Dataset,
    /// The network peer
    Peer,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Client => write!(f, "client file"),
            Source::Dataset => write!(f, "dataset file"),
            Source::Peer => write!(f, "peer"),
        }
    }
}

/// Verification error
#[derive(Debug, Error)]
pub enum AuditError {
    /// A file ended before the expected number of bytes
    #[error("short read from {origin}: {context} needs {expected} bytes")]
    ShortRead {
        origin: Source,
        context: String,
        expected: usize,
    },

    /// A file had bytes left over after decoding
    #[error("trailing data in {origin}: {extra} unexpected bytes")]
    TrailingData { origin: Source, extra: u64 },

    /// The peer sent something the protocol does not allow
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport failure while talking to the peer
    #[error("connection error while {context}: {source}")]
    Connection {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Vectors of unequal length passed to an inner product
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Header dimensions that cannot describe a valid matrix
    #[error("invalid dimensions n={n}, m={m}")]
    InvalidDimensions { n: u64, m: u64 },

    /// A file read failed for a reason other than running out of bytes
    #[error("read error in {origin} while reading {context}: {source}")]
    FileRead {
        origin: Source,
        context: String,
        #[source]
        source: io::Error,
    },

    /// Failure opening or mapping a file
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AuditError {
    pub(crate) fn connection(context: impl Into<String>, source: io::Error) -> Self {
        Self::Connection {
            context: context.into(),
            source,
        }
    }
}

/// Result type for verification operations
pub type Result<T> = std::result::Result<T, AuditError>;
