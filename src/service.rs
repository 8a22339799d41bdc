//! Request boundary in front of the sandbox.
//!
//! Transport-free: a network layer hands over the raw body and relays the
//! returned [`Response`] as-is.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SandboxError};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::executor::JsSandbox;
use crate::sandbox::output::ExecutionResult;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const CODE_REQUIRED: &str = "Code is required and must be a string";

/// Response status, mirroring the HTTP codes a transport would use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    PayloadTooLarge,
    InternalServerError,
}

impl Status {
    /// The numeric HTTP status code.
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::PayloadTooLarge => 413,
            Status::InternalServerError => 500,
        }
    }
}

/// Status plus body of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: ExecutionResult,
}

impl Response {
    fn new(status: Status, body: ExecutionResult) -> Self {
        Self { status, body }
    }
}

/// An execution request as received on the wire.
///
/// `code` is kept as a raw JSON value so a non-string can be rejected with
/// the right message instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionRequest {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default, rename = "timeoutMs", alias = "timeout")]
    pub timeout_ms: Option<u64>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub code: String,
    pub timeout_ms: u64,
}

impl ExecutionRequest {
    /// A request for `code` with an optional timeout.
    pub fn new(code: impl Into<String>, timeout_ms: Option<u64>) -> Self {
        Self {
            code: Some(Value::String(code.into())),
            timeout_ms,
        }
    }

    /// Check the code and clamp the timeout.
    pub fn validate(self, config: &SandboxConfig) -> Result<ValidatedRequest> {
        let code = match self.code {
            Some(Value::String(code)) if !code.is_empty() => code,
            _ => return Err(SandboxError::InvalidRequest(CODE_REQUIRED.to_string())),
        };
        Ok(ValidatedRequest {
            code,
            timeout_ms: config.clamp_timeout_ms(self.timeout_ms),
        })
    }
}

/// Validate and run a decoded request.
pub async fn handle(sandbox: &JsSandbox, request: ExecutionRequest) -> Response {
    let request = match request.validate(sandbox.config()) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "request rejected");
            return Response::new(Status::BadRequest, ExecutionResult::rejected(e.to_string()));
        }
    };

    match sandbox.execute(&request.code, request.timeout_ms).await {
        Ok(result) => Response::new(Status::Ok, result),
        Err(e) => {
            tracing::error!(error = %e, "execution failed on the host");
            Response::new(
                Status::InternalServerError,
                ExecutionResult::rejected(e.to_string()),
            )
        }
    }
}

/// Decode a raw JSON body and handle it.
pub async fn handle_body(sandbox: &JsSandbox, body: &[u8]) -> Response {
    if body.len() > MAX_BODY_BYTES {
        return Response::new(
            Status::PayloadTooLarge,
            ExecutionResult::rejected(format!(
                "Request body exceeds {} bytes",
                MAX_BODY_BYTES
            )),
        );
    }

    match serde_json::from_slice::<ExecutionRequest>(body) {
        Ok(request) => handle(sandbox, request).await,
        Err(e) => Response::new(
            Status::BadRequest,
            ExecutionResult::rejected(format!("Invalid request: {}", e)),
        ),
    }
}

/// Liveness payload, independent of the sandbox.
pub fn health() -> Value {
    serde_json::json!({ "status": "ok" })
}
