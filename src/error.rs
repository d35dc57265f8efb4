//! Error handling for the PSI engine.
//!
//! Every public entry point returns [`Result`]; the variants follow the
//! engine's failure taxonomy: configuration errors (parameter or shape
//! mismatches, never retried), capacity errors (a bin overflowed its declared
//! bound), and backend errors surfaced unchanged from the HE ring.

use std::fmt;

/// PSI engine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Parameter or shape mismatch (degree mismatch, unreachable power,
    /// chunk/power-count disagreement). Indicates a programming error.
    Config(String),
    /// A bin's occupancy would exceed the declared maximum; the caller must
    /// re-run with a larger bound.
    Capacity {
        bin: usize,
        occupancy: usize,
        max_bin: usize,
    },
    /// Failure reported by the HE ring backend (e.g. insufficient remaining
    /// multiplicative depth). Deterministic for fixed parameters.
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Capacity {
                bin,
                occupancy,
                max_bin,
            } => write!(
                f,
                "bin {} occupancy {} exceeds declared maximum {}",
                bin, occupancy, max_bin
            ),
            Error::Backend(msg) => write!(f, "backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }
}

/// Result type for PSI engine operations.
pub type Result<T> = std::result::Result<T, Error>;
