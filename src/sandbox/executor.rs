//! Execution sessions and the async sandbox front end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rquickjs::context::EvalOptions;
use rquickjs::{Ctx, Value};
use tokio::sync::Semaphore;

use crate::error::{Result, SandboxError};
use crate::sandbox::arena::{Arena, ArenaLedger};
use crate::sandbox::classify::{self, RawFault};
use crate::sandbox::config::SandboxConfig;
use crate::sandbox::output::{CapturedOutput, ExecutionResult, OutputEntry};
use crate::sandbox::{bootstrap, bridge, serialize};

/// A single execution: one arena, one script, one result.
///
/// Sessions are synchronous and run on the calling thread. The arena is
/// created inside [`Session::run`] and dropped before it returns.
pub struct Session {
    config: SandboxConfig,
    timeout_ms: u64,
    ledger: Arc<ArenaLedger>,
}

impl Session {
    /// Prepare a session that will run with the given wall-clock budget.
    pub fn new(config: SandboxConfig, timeout_ms: u64, ledger: Arc<ArenaLedger>) -> Self {
        Self {
            config,
            timeout_ms,
            ledger,
        }
    }

    /// Run `code` and collect its output.
    ///
    /// Faults raised by the code (syntax errors, exceptions, timeouts,
    /// memory exhaustion) end up in the returned result. `Err` is reserved
    /// for failures to set the session up.
    pub fn run(self, code: &str) -> Result<ExecutionResult> {
        let started = Instant::now();
        tracing::debug!(
            timeout_ms = self.timeout_ms,
            code_len = code.len(),
            "session starting"
        );

        let arena = Arena::new(&self.config, Arc::clone(&self.ledger))?;
        let output = CapturedOutput::new();

        arena.with(|ctx| -> Result<()> {
            bridge::install(&ctx, &output).map_err(|e| {
                SandboxError::Bootstrap(format!("failed to install console hooks: {}", e))
            })?;
            bootstrap::run(&ctx)
        })?;

        arena.arm_deadline(Duration::from_millis(self.timeout_ms));
        let outcome = arena
            .with(|ctx| match evaluate(&ctx, code) {
                Ok(value) => Ok(serialize::completion_entry(&ctx, &value)),
                Err(error) => Err(arena.fault(&ctx, error)),
            })
            .and_then(|completion| {
                arena.drain_jobs()?;
                Ok(completion)
            });
        let outcome = arena.settle(outcome);

        let result = self.finish(outcome, output.take());
        drop(arena);

        tracing::debug!(
            success = result.success,
            entries = result.output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "session finished"
        );
        Ok(result)
    }

    fn finish(
        &self,
        outcome: std::result::Result<Option<OutputEntry>, RawFault>,
        mut entries: Vec<OutputEntry>,
    ) -> ExecutionResult {
        match outcome {
            Ok(completion) => {
                entries.extend(completion);
                ExecutionResult::completed(entries)
            }
            Err(fault) => {
                let classified = classify::classify(&fault, self.timeout_ms);
                tracing::info!(
                    kind = %classified.kind,
                    error = %classified.message,
                    "session failed"
                );
                ExecutionResult::failed(entries, classified.message)
            }
        }
    }
}

/// Evaluate user code as a sloppy-mode global script.
fn evaluate<'js>(ctx: &Ctx<'js>, code: &str) -> rquickjs::Result<Value<'js>> {
    let mut options = EvalOptions::default();
    options.strict = false;
    ctx.eval_with_options(code, options)
}

/// A JavaScript sandbox.
///
/// Every call to [`JsSandbox::execute`] runs in a fresh arena on a blocking
/// worker thread; nothing is shared between executions.
pub struct JsSandbox {
    config: SandboxConfig,
    ledger: Arc<ArenaLedger>,
    permits: Option<Arc<Semaphore>>,
}

impl JsSandbox {
    /// Create a new sandbox with the given configuration.
    pub fn new(config: SandboxConfig) -> Self {
        let permits = config
            .max_concurrent
            .map(|sessions| Arc::new(Semaphore::new(sessions.max(1))));
        Self {
            config,
            ledger: Arc::new(ArenaLedger::new()),
            permits,
        }
    }

    /// The configuration this sandbox was built with.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Arena accounting for every session this sandbox has run.
    pub fn ledger(&self) -> &ArenaLedger {
        &self.ledger
    }

    /// Execute JavaScript code with a wall-clock budget of `timeout_ms`.
    ///
    /// The timeout is used as given; clamping is up to the caller.
    pub async fn execute(&self, code: &str, timeout_ms: u64) -> Result<ExecutionResult> {
        let _permit = match &self.permits {
            Some(permits) => Some(Arc::clone(permits).acquire_owned().await.map_err(|e| {
                SandboxError::ExecutionFailed(format!("admission closed: {}", e))
            })?),
            None => None,
        };

        let session = Session::new(self.config.clone(), timeout_ms, Arc::clone(&self.ledger));
        let code = code.to_string();

        tokio::task::spawn_blocking(move || session.run(&code))
            .await
            .map_err(|e| SandboxError::ExecutionFailed(format!("session task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::output::OutputKind;

    fn run(code: &str, timeout_ms: u64) -> ExecutionResult {
        let ledger = Arc::new(ArenaLedger::new());
        Session::new(SandboxConfig::default(), timeout_ms, ledger)
            .run(code)
            .unwrap()
    }

    #[test]
    fn test_log_then_result() {
        let result = run("console.log('hi'); 1+1", 10_000);
        assert!(result.is_success());
        assert_eq!(
            result.output,
            vec![
                OutputEntry::new(OutputKind::Log, "hi"),
                OutputEntry::new(OutputKind::Result, "=> 2"),
            ]
        );
    }

    #[test]
    fn test_sloppy_mode_globals() {
        let result = run("undeclared = 5; undeclared * 2", 10_000);
        assert_eq!(result.result_text(), Some("=> 10"));
    }

    #[test]
    fn test_output_before_fault_is_kept() {
        let result = run("console.warn('first'); null.x", 10_000);
        assert!(!result.is_success());
        assert_eq!(result.output[0], OutputEntry::new(OutputKind::Warn, "first"));
        assert_eq!(result.output.len(), 2);
        assert_eq!(result.output[1].kind, OutputKind::Error);
    }

    #[test]
    fn test_promise_jobs_run_before_result() {
        let result = run(
            "Promise.resolve().then(() => console.log('later')); console.log('now'); 'done'",
            10_000,
        );
        let texts: Vec<_> = result.output.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["now", "later", "=> done"]);
    }

    #[test]
    fn test_session_releases_arena() {
        let ledger = Arc::new(ArenaLedger::new());
        Session::new(SandboxConfig::default(), 50, Arc::clone(&ledger))
            .run("while (true) {}")
            .unwrap();
        assert_eq!(ledger.created(), 1);
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn test_execute_on_blocking_pool() {
        let sandbox = JsSandbox::new(SandboxConfig::default());
        let result =
            tokio_test::block_on(sandbox.execute("[1, 2].map(x => x * 2)", 1_000)).unwrap();
        assert_eq!(result.result_text(), Some("=> [2,4]"));
        assert_eq!(sandbox.ledger().live(), 0);
    }
}
