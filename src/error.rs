//! Error types for the JavaScript sandbox.
//!
//! Faults raised by user code never show up here: they are reported inside
//! [`ExecutionResult`](crate::ExecutionResult). A `SandboxError` means the
//! host could not build a result at all, or a request never reached the
//! sandbox.

use thiserror::Error;

/// Errors that can occur outside of user code.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Failed to allocate the runtime or context of an arena.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// The trusted setup script failed.
    #[error("failed to bootstrap session: {0}")]
    Bootstrap(String),

    /// The worker running a session died before producing a result.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The request was rejected before it reached the sandbox.
    #[error("{0}")]
    InvalidRequest(String),
}

impl SandboxError {
    /// Check if this error is a rejected request rather than a host fault.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, SandboxError::InvalidRequest(_))
    }

    /// Check if this error came from session setup.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            SandboxError::RuntimeInit(_) | SandboxError::Bootstrap(_)
        )
    }
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
