//! Mapping of raw isolation faults onto the user-facing error taxonomy.

use std::fmt;

use super::config::MEMORY_LIMIT_MB;

/// Message used when the runtime gave no text for a fault.
pub const UNKNOWN_ERROR: &str = "Unknown error";

// Text fallbacks for faults that arrive without a structured code. QuickJS
// reports interrupts and allocation failures with the first of each pair.
const TIMEOUT_MARKERS: &[&str] = &["interrupted", "Script execution timed out"];
const MEMORY_MARKERS: &[&str] = &["out of memory", "Isolate was disposed"];

/// Category of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The deadline fired while the script was running.
    Timeout,
    /// The arena hit its memory ceiling.
    MemoryLimit,
    /// Syntax error, uncaught exception, or anything else.
    Generic,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Timeout => f.write_str("timeout"),
            FaultKind::MemoryLimit => f.write_str("memory_limit"),
            FaultKind::Generic => f.write_str("generic"),
        }
    }
}

/// A fault as reported by the isolation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFault {
    /// Text of the fault, if any.
    pub message: Option<String>,
    /// Structured category, when the arena observed one directly.
    pub code: Option<FaultKind>,
}

impl RawFault {
    /// A fault known only by its text.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            code: None,
        }
    }

    /// Attach a structured category.
    pub fn with_code(mut self, code: FaultKind) -> Self {
        self.code = Some(code);
        self
    }
}

/// A classified fault, ready for the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFault {
    pub kind: FaultKind,
    pub message: String,
}

/// Classify `fault` for a session that ran with `timeout_ms`.
///
/// A structured code wins over text matching. Without one, the message is
/// searched for the runtime's timeout and memory markers.
pub fn classify(fault: &RawFault, timeout_ms: u64) -> ClassifiedFault {
    let raw = fault
        .message
        .as_deref()
        .filter(|message| !message.is_empty())
        .unwrap_or(UNKNOWN_ERROR);

    let kind = fault.code.unwrap_or_else(|| kind_from_text(raw));
    let message = match kind {
        FaultKind::Timeout => format!("Execution timed out (limit: {}ms)", timeout_ms),
        FaultKind::MemoryLimit => {
            format!("Memory limit exceeded (limit: {}MB)", MEMORY_LIMIT_MB)
        }
        FaultKind::Generic => raw.to_string(),
    };

    ClassifiedFault { kind, message }
}

fn kind_from_text(message: &str) -> FaultKind {
    if TIMEOUT_MARKERS.iter().any(|marker| message.contains(marker)) {
        FaultKind::Timeout
    } else if MEMORY_MARKERS.iter().any(|marker| message.contains(marker)) {
        FaultKind::MemoryLimit
    } else {
        FaultKind::Generic
    }
}
