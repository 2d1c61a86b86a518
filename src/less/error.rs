//! Compilation error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning LESS source into CSS.
///
/// Parse errors carry 1-based line and column numbers pointing at the
/// offending input.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("undefined variable @{name}")]
    UndefinedVariable { name: String },

    #[error("circular reference in variable @{name}")]
    CircularVariable { name: String },

    #[error("unsupported at-rule `@{directive}` on line {line}")]
    Unsupported { directive: String, line: usize },
}
