//! # JS Sandbox
//!
//! Resource-bounded execution of untrusted JavaScript snippets.
//!
//! Every execution gets its own embedded QuickJS runtime and context, which
//! are torn down before the call returns. The sandbox enforces:
//!
//! - **Memory limits**: a fixed 128MB ceiling per execution
//! - **Timeout protection**: an interrupt handler aborts scripts past their
//!   wall-clock budget, even in tight loops
//! - **No ambient capabilities**: timers, `fetch`, `XMLHttpRequest`,
//!   `WebSocket` and `EventSource` are pinned to `undefined`
//! - **Captured diagnostics**: `console.*` calls become ordered output
//!   entries, followed by the script's completion value
//!
//! ## Example
//!
//! ```rust,no_run
//! use js_sandbox_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let sandbox = JsSandbox::new(SandboxConfig::default());
//!     let result = sandbox.execute("console.log('hi'); 1 + 1", 1_000).await?;
//!
//!     assert!(result.is_success());
//!     assert_eq!(result.result_text(), Some("=> 2"));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Syntax errors, uncaught exceptions, timeouts and memory exhaustion are
//! reported inside [`ExecutionResult`] with `success == false`. Only host
//! faults surface as [`SandboxError`].

pub mod error;
pub mod prelude;
pub mod sandbox;
pub mod service;

// Re-export main types at crate root for convenience
pub use error::{Result, SandboxError};
pub use sandbox::arena::ArenaLedger;
pub use sandbox::classify::{classify, ClassifiedFault, FaultKind, RawFault};
pub use sandbox::config::{SandboxConfig, SandboxConfigBuilder, MEMORY_LIMIT_MB};
pub use sandbox::executor::{JsSandbox, Session};
pub use sandbox::output::{ExecutionResult, OutputEntry, OutputKind};
pub use service::{ExecutionRequest, Response, Status};
