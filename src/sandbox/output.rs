//! Captured output entries and the structured execution result.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Kind tag of a captured output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// `console.log`, `console.debug`, `console.trace`.
    Log,
    /// `console.error` and synthetic fault entries.
    Error,
    /// `console.warn`.
    Warn,
    /// `console.info`.
    Info,
    /// The script's completion value.
    Result,
}

impl OutputKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Log => "log",
            OutputKind::Error => "error",
            OutputKind::Warn => "warn",
            OutputKind::Info => "info",
            OutputKind::Result => "result",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub text: String,
}

impl OutputEntry {
    pub fn new(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Result of a JavaScript execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the script ran to completion.
    pub success: bool,
    /// Captured output in emission order.
    pub output: Vec<OutputEntry>,
    /// Classified fault message, present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A successful result carrying `output`.
    pub fn completed(output: Vec<OutputEntry>) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// A failed result. Appends the synthetic `error` entry for `message`.
    pub fn failed(mut output: Vec<OutputEntry>, message: impl Into<String>) -> Self {
        let message = message.into();
        output.push(OutputEntry::new(
            OutputKind::Error,
            format!("Error: {}", message),
        ));
        Self {
            success: false,
            output,
            error: Some(message),
        }
    }

    /// A failed result with no output, as reported by the service boundary.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Check if the execution was successful.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Entries of one kind, in order.
    pub fn entries(&self, kind: OutputKind) -> impl Iterator<Item = &OutputEntry> {
        self.output.iter().filter(move |entry| entry.kind == kind)
    }

    /// Text of the `result` entry, if the script produced a value.
    pub fn result_text(&self) -> Option<&str> {
        self.entries(OutputKind::Result)
            .next()
            .map(|entry| entry.text.as_str())
    }
}

/// Append-only buffer that bridge hooks write entries into.
#[derive(Clone, Debug, Default)]
pub struct CapturedOutput {
    entries: Arc<Mutex<Vec<OutputEntry>>>,
}

impl CapturedOutput {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn push(&self, kind: OutputKind, text: impl Into<String>) {
        self.lock().push(OutputEntry::new(kind, text));
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take all captured entries, leaving the buffer empty.
    pub fn take(&self) -> Vec<OutputEntry> {
        std::mem::take(&mut *self.lock())
    }

    // A panic while holding the lock cannot leave a half-written entry.
    fn lock(&self) -> MutexGuard<'_, Vec<OutputEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
