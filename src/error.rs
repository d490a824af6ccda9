//! Compiler errors
//!
//! Every failure is reported before any resource is handed back, so callers
//! either get a complete resource list or one of these.

use thiserror::Error;

/// Errors produced while compiling a project spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Invalid or contradictory input. Fix the spec and compile again.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The assembled resource list broke one of its own invariants
    /// (duplicate name, dependency on a missing or later resource).
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl CompileError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InternalInvariant(msg.into())
    }

    /// True for errors the user can fix by editing the spec.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
