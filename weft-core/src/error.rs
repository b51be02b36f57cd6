//! Runtime errors

use std::fmt;

use thiserror::Error;

use crate::host::HostError;

/// Crate result type
pub type Result<T> = std::result::Result<T, ReactiveError>;

/// Which kind of reactive computation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationKind {
    Derivation,
    Binding,
}

impl fmt::Display for ComputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationKind::Derivation => f.write_str("derivation"),
            ComputationKind::Binding => f.write_str("binding"),
        }
    }
}

/// Reactive runtime errors
///
/// Computation failures and non-convergence are recovered inside a flush and
/// surfaced as diagnostics (see `Runtime::take_diagnostics`) rather than
/// aborting the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactiveError {
    #[error("{kind} failed: {message}")]
    ComputationFailed {
        kind: ComputationKind,
        message: String,
    },

    #[error("derivations did not settle within {rounds} rounds (probable dependency cycle)")]
    NonConvergence { rounds: usize },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl From<serde_json::Error> for ReactiveError {
    fn from(err: serde_json::Error) -> Self {
        ReactiveError::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NodeRef;

    #[test]
    fn messages_name_the_failure() {
        let err = ReactiveError::ComputationFailed {
            kind: ComputationKind::Binding,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "binding failed: boom");

        let err = ReactiveError::NonConvergence { rounds: 100 };
        assert!(err.to_string().contains("100 rounds"));

        let err: ReactiveError = HostError::UnknownNode(NodeRef::from_raw(7)).into();
        assert_eq!(err.to_string(), "unknown node #7");
    }
}
