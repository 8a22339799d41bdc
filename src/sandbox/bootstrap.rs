//! Trusted per-session setup script.

use rquickjs::Ctx;

use crate::error::{Result, SandboxError};
use crate::sandbox::serialize;

/// Globals pinned to `undefined` so user code cannot schedule work or reach
/// the network.
pub const DISABLED_GLOBALS: &[&str] = &[
    "setTimeout",
    "setInterval",
    "setImmediate",
    "clearTimeout",
    "clearInterval",
    "clearImmediate",
    "fetch",
    "XMLHttpRequest",
    "WebSocket",
    "EventSource",
];

/// Builds `console` from the bridge hooks, hides the hooks, and disables
/// [`DISABLED_GLOBALS`].
const BOOTSTRAP: &str = r#"
(function (root, disabled) {
  'use strict';
  const take = (name) => {
    const hook = root[name];
    delete root[name];
    return (...args) => { hook(...args); };
  };
  const log = take('__sandbox_log');
  const error = take('__sandbox_error');
  const warn = take('__sandbox_warn');
  const info = take('__sandbox_info');

  const pin = (name, value, writable) => Object.defineProperty(root, name, {
    value: value,
    writable: writable,
    enumerable: false,
    configurable: writable,
  });

  pin('console', Object.freeze({
    log: log,
    error: error,
    warn: warn,
    info: info,
    debug: log,
    trace: log,
  }), false);
  pin('global', root, true);

  for (const name of disabled) {
    pin(name, undefined, false);
  }
})(globalThis, __sandbox_disabled);
delete globalThis.__sandbox_disabled;
"#;

/// Run the bootstrap script in `ctx`. The bridge hooks must already be
/// installed.
pub fn run(ctx: &Ctx<'_>) -> Result<()> {
    let globals = ctx.globals();
    globals
        .set("__sandbox_disabled", DISABLED_GLOBALS.to_vec())
        .map_err(|e| SandboxError::Bootstrap(e.to_string()))?;

    ctx.eval::<(), _>(BOOTSTRAP).map_err(|e| {
        let detail = match e {
            rquickjs::Error::Exception => {
                let thrown = ctx.catch();
                serialize::coerce_string(ctx, &thrown)
            }
            other => other.to_string(),
        };
        tracing::error!(error = %detail, "bootstrap script failed");
        SandboxError::Bootstrap(detail)
    })
}
