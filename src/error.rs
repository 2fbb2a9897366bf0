use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Which side of a two-stage pipeline an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Left,
    Right,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Left => write!(f, "left"),
            Stage::Right => write!(f, "right"),
        }
    }
}

/// Errors produced while parsing a line or running what it describes.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Backing storage for a token, argument vector or path could not be grown.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("failed to create pipe: {0}")]
    Pipe(#[source] io::Error),

    /// One of the pipeline's processes could not be created.
    #[error("failed to spawn {stage} stage: {source}")]
    Spawn {
        stage: Stage,
        #[source]
        source: io::Error,
    },

    /// A program image could not be started.
    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed input: {reason}")]
    MalformedInput { reason: &'static str },

    #[error("syntax error near unexpected token `|' ({stage} side is empty)")]
    EmptyCommand { stage: Stage },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Spawn failures are the only errors that may end the interpreter.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, ShellError::Pipe(_) | ShellError::Spawn { .. })
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_converts_from_try_reserve() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let shell_err: ShellError = err.into();
        assert!(matches!(shell_err, ShellError::Allocation(_)));
        assert!(!shell_err.is_spawn_failure());
    }

    #[test]
    fn test_spawn_failure_message_names_stage() {
        let err = ShellError::Spawn {
            stage: Stage::Right,
            source: io::Error::new(io::ErrorKind::Other, "fork failed"),
        };
        assert!(err.is_spawn_failure());
        assert_eq!(err.to_string(), "failed to spawn right stage: fork failed");
    }
}
