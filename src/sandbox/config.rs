//! Sandbox configuration with builder pattern.

use std::time::Duration;

/// Hard memory ceiling of every arena, in megabytes.
///
/// This is process-wide and deliberately not part of [`SandboxConfig`].
pub const MEMORY_LIMIT_MB: usize = 128;

/// [`MEMORY_LIMIT_MB`] in bytes.
pub const MEMORY_LIMIT_BYTES: usize = MEMORY_LIMIT_MB * 1024 * 1024;

/// Timeout applied when a request does not carry one.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Largest timeout the service boundary lets through.
pub const MAX_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the JavaScript sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Timeout used when a request omits one.
    pub default_timeout: Duration,
    /// Upper bound requests are clamped to at the service boundary.
    pub max_timeout: Duration,
    /// Maximum native stack the interpreter may use, in bytes.
    pub max_stack_size: usize,
    /// Maximum number of sessions running at once (`None` = unbounded).
    pub max_concurrent: Option<usize>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_timeout: Duration::from_millis(MAX_TIMEOUT_MS),
            max_stack_size: 256 * 1024, // 256KB
            max_concurrent: None,
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    /// Clamp a caller-supplied timeout into `[1, max_timeout]`, falling back
    /// to the default when none was given.
    pub fn clamp_timeout_ms(&self, requested: Option<u64>) -> u64 {
        let max = duration_ms(self.max_timeout).max(1);
        requested
            .unwrap_or_else(|| duration_ms(self.default_timeout))
            .clamp(1, max)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    default_timeout: Option<Duration>,
    max_timeout: Option<Duration>,
    max_stack_size: Option<usize>,
    max_concurrent: Option<usize>,
}

impl SandboxConfigBuilder {
    /// Set the timeout used when a request omits one.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Set the maximum timeout a request may ask for.
    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = Some(timeout);
        self
    }

    /// Set the interpreter stack limit in bytes.
    pub fn max_stack_size(mut self, bytes: usize) -> Self {
        self.max_stack_size = Some(bytes);
        self
    }

    /// Bound the number of sessions that may run at once.
    pub fn max_concurrent(mut self, sessions: usize) -> Self {
        self.max_concurrent = Some(sessions);
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        SandboxConfig {
            default_timeout: self.default_timeout.unwrap_or(default.default_timeout),
            max_timeout: self.max_timeout.unwrap_or(default.max_timeout),
            max_stack_size: self.max_stack_size.unwrap_or(default.max_stack_size),
            max_concurrent: self.max_concurrent.or(default.max_concurrent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(10));
        assert_eq!(config.max_timeout, Duration::from_secs(10));
        assert!(config.max_concurrent.is_none());
    }

    #[test]
    fn test_builder() {
        let config = SandboxConfig::builder()
            .default_timeout(Duration::from_secs(2))
            .max_timeout(Duration::from_secs(5))
            .max_stack_size(512 * 1024)
            .max_concurrent(4)
            .build();

        assert_eq!(config.default_timeout, Duration::from_secs(2));
        assert_eq!(config.max_timeout, Duration::from_secs(5));
        assert_eq!(config.max_stack_size, 512 * 1024);
        assert_eq!(config.max_concurrent, Some(4));
    }

    #[test]
    fn test_clamp_timeout() {
        let config = SandboxConfig::default();
        assert_eq!(config.clamp_timeout_ms(None), 10_000);
        assert_eq!(config.clamp_timeout_ms(Some(100)), 100);
        assert_eq!(config.clamp_timeout_ms(Some(60_000)), 10_000);
        assert_eq!(config.clamp_timeout_ms(Some(0)), 1);
    }

    #[test]
    fn test_memory_limit_constant() {
        assert_eq!(MEMORY_LIMIT_BYTES, 134_217_728);
    }
}
