//! Isolation arenas backed by QuickJS.
//!
//! An [`Arena`] owns exactly one `rquickjs` runtime and one context inside
//! it. The runtime allocates through a [`SandboxLimiter`] and carries the
//! stack limit and the wall-clock deadline; dropping the arena tears both
//! down.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rquickjs::{Context, Ctx, Runtime, Value};

use crate::error::{Result, SandboxError};
use crate::sandbox::classify::{FaultKind, RawFault};
use crate::sandbox::config::{SandboxConfig, MEMORY_LIMIT_BYTES};
use crate::sandbox::limits::{MemoryMeter, SandboxLimiter};
use crate::sandbox::serialize;

/// Accounting of arenas created and released.
///
/// Every arena registers here when it is created and deregisters after its
/// runtime has been freed, so `live() == 0` means nothing is left allocated.
#[derive(Debug, Default)]
pub struct ArenaLedger {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl ArenaLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arenas ever created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of arenas torn down.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of arenas currently allocated.
    pub fn live(&self) -> usize {
        self.created().saturating_sub(self.released())
    }
}

/// Registration of one arena in a ledger, released on drop.
#[derive(Debug)]
struct Lease {
    ledger: Arc<ArenaLedger>,
}

impl Lease {
    fn acquire(ledger: Arc<ArenaLedger>) -> Self {
        ledger.created.fetch_add(1, Ordering::SeqCst);
        Self { ledger }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// One runtime + context pair with its resource limits applied.
pub struct Arena {
    // Fields drop in declaration order: context, runtime, then the lease.
    context: Context,
    runtime: Runtime,
    deadline: Cell<Option<Instant>>,
    timed_out: Arc<AtomicBool>,
    meter: Arc<MemoryMeter>,
    _lease: Lease,
}

impl Arena {
    /// Allocate a runtime with the fixed memory ceiling and a full context.
    pub fn new(config: &SandboxConfig, ledger: Arc<ArenaLedger>) -> Result<Self> {
        let meter = Arc::new(MemoryMeter::new(MEMORY_LIMIT_BYTES));
        let limiter = SandboxLimiter::new(Arc::clone(&meter));
        let runtime = Runtime::new_with_alloc(limiter).map_err(|e| {
            SandboxError::RuntimeInit(anyhow::anyhow!("failed to create runtime: {}", e))
        })?;
        runtime.set_max_stack_size(config.max_stack_size);

        let context = Context::full(&runtime).map_err(|e| {
            SandboxError::RuntimeInit(anyhow::anyhow!("failed to create context: {}", e))
        })?;

        Ok(Self {
            context,
            runtime,
            deadline: Cell::new(None),
            timed_out: Arc::new(AtomicBool::new(false)),
            meter,
            _lease: Lease::acquire(ledger),
        })
    }

    /// Start the wall-clock budget. Code run before this call is unbounded.
    ///
    /// The same handler also stops the script once the memory ceiling has
    /// been hit.
    pub fn arm_deadline(&self, budget: Duration) {
        let deadline = Instant::now() + budget;
        self.deadline.set(Some(deadline));
        let timed_out = Arc::clone(&self.timed_out);
        let meter = Arc::clone(&self.meter);
        self.runtime
            .set_interrupt_handler(Some(Box::new(move || {
                if meter.limit_exceeded() {
                    return true;
                }
                if Instant::now() >= deadline {
                    timed_out.store(true, Ordering::SeqCst);
                    return true;
                }
                false
            })));
    }

    /// Whether the deadline interrupted the script.
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Whether the runtime was ever refused memory.
    pub fn memory_exceeded(&self) -> bool {
        self.meter.limit_exceeded()
    }

    /// Heap accounting for this arena's runtime.
    pub fn meter(&self) -> &MemoryMeter {
        &self.meter
    }

    /// Run `f` with the arena's context entered.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Ctx<'_>) -> R,
    {
        self.context.with(f)
    }

    /// Run queued promise jobs until none remain or the deadline passes.
    ///
    /// Must not be called from inside [`Arena::with`].
    pub fn drain_jobs(&self) -> std::result::Result<(), RawFault> {
        loop {
            // A chain of short jobs may never reach the interrupt check.
            if self.deadline.get().is_some_and(|at| Instant::now() >= at) {
                self.timed_out.store(true, Ordering::SeqCst);
                return Err(RawFault::message("interrupted").with_code(FaultKind::Timeout));
            }
            match self.runtime.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(job) => {
                    let fault = job.0.with(|ctx| {
                        let thrown = ctx.catch();
                        describe_thrown(&ctx, &thrown)
                    });
                    return Err(self.stamp(fault));
                }
            }
        }
    }

    /// Convert an evaluation error into a raw fault.
    pub fn fault(&self, ctx: &Ctx<'_>, error: rquickjs::Error) -> RawFault {
        let fault = match error {
            rquickjs::Error::Exception => {
                let thrown = ctx.catch();
                describe_thrown(ctx, &thrown)
            }
            rquickjs::Error::Allocation => {
                RawFault::message("out of memory").with_code(FaultKind::MemoryLimit)
            }
            other => RawFault::message(other.to_string()).with_code(FaultKind::Generic),
        };
        self.stamp(fault)
    }

    /// Final verdict on a session once the context has been left.
    ///
    /// Hitting the memory ceiling fails the session even when the script
    /// caught the error and finished normally.
    pub fn settle<T>(
        &self,
        outcome: std::result::Result<T, RawFault>,
    ) -> std::result::Result<T, RawFault> {
        if self.memory_exceeded() {
            return Err(RawFault::message("out of memory").with_code(FaultKind::MemoryLimit));
        }
        outcome.map_err(|fault| self.stamp(fault))
    }

    // The interrupt flag is authoritative: whatever QuickJS reported after an
    // interrupt is a timeout.
    fn stamp(&self, fault: RawFault) -> RawFault {
        if self.timed_out() {
            fault.with_code(FaultKind::Timeout)
        } else {
            fault
        }
    }
}

/// Describe a thrown JS value.
fn describe_thrown<'js>(ctx: &Ctx<'js>, thrown: &Value<'js>) -> RawFault {
    match thrown.as_exception() {
        Some(exception) => RawFault {
            message: exception.message(),
            code: Some(FaultKind::Generic),
        },
        None => RawFault::message(serialize::coerce_string(ctx, thrown))
            .with_code(FaultKind::Generic),
    }
}
