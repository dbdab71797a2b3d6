//! Error types for building and loading word graphs.

use std::path::PathBuf;

/// Result type used throughout this crate.
///
/// Uses [`DawgError`] as the default error type.
pub type Result<T, E = DawgError> = std::result::Result<T, E>;

/// Errors that can occur while building, writing or loading a DAWG.
#[derive(Debug, thiserror::Error)]
pub enum DawgError {
    /// Words were not provided in strictly ascending order.
    ///
    /// Contains the previously accepted word and the offending word.
    #[error("word {word:?} does not come after {previous:?}")]
    Order {
        /// The last word accepted by the builder.
        previous: String,
        /// The word that broke the ordering.
        word: String,
    },

    /// A word contains a character reserved by the text serialization.
    #[error("word {word:?} contains the reserved character {ch:?}")]
    ReservedChar {
        /// The rejected word.
        word: String,
        /// The first reserved character found.
        ch: char,
    },

    /// A word is longer than the configured maximum.
    #[error("word {word:?} has {len} characters, the maximum is {max}")]
    WordTooLong {
        /// The rejected word.
        word: String,
        /// Length of the word in characters.
        len: usize,
        /// The configured limit.
        max: usize,
    },

    /// The empty string cannot be stored in a graph.
    #[error("empty words cannot be added")]
    EmptyWord,

    /// A serialized graph could not be parsed.
    #[error("malformed graph at line {line}: {message}")]
    Format {
        /// 1-based line number, or 0 for errors about the file as a whole.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A path that should be a file is a directory.
    #[error("the path '{0}' is a directory, but a file was expected")]
    PathIsDirectory(PathBuf),

    /// Standard I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DawgError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        DawgError::Format {
            line,
            message: message.into(),
        }
    }
}
