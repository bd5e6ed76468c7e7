// error.rs - Library error type

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the repeat calling engine and its adapters
#[derive(Error, Debug)]
pub enum TreError {
    /// A required external binary is not on PATH (fatal)
    #[error("can't find {0} in PATH")]
    ToolNotFound(String),

    /// An external tool ran but left no output artifact behind (fatal)
    #[error("{tool} completed without producing {}", path.display())]
    MissingOutput { tool: String, path: PathBuf },

    /// The external tool could not be started at all (fatal)
    #[error("failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("alignment file: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("malformed {what} at line {line}: {reason}")]
    Parse {
        what: &'static str,
        line: usize,
        reason: String,
    },

    /// Sequence name absent from a FASTA source; callers skip the read
    #[error("sequence '{0}' not found")]
    MissingSequence(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("worker pool: {0}")]
    Pool(String),
}

impl TreError {
    /// Whether the error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TreError::MissingSequence(_))
    }

    pub fn parse(what: &'static str, line: usize, reason: impl Into<String>) -> Self {
        TreError::Parse {
            what,
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TreError::ToolNotFound("trf".to_string()).is_fatal());
        assert!(TreError::MissingOutput {
            tool: "blastn".to_string(),
            path: PathBuf::from("/tmp/x.out"),
        }
        .is_fatal());
        assert!(!TreError::MissingSequence("read1".to_string()).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = TreError::ToolNotFound("trf".to_string());
        assert_eq!(err.to_string(), "can't find trf in PATH");

        let err = TreError::parse("locus file", 3, "expected 5 columns");
        assert_eq!(
            err.to_string(),
            "malformed locus file at line 3: expected 5 columns"
        );
    }
}
