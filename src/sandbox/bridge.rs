//! Host-side console hooks callable from inside the arena.
//!
//! Each hook call is one message from sandboxed code to the host: its
//! arguments are rendered to text, joined with single spaces and appended to
//! the session's [`CapturedOutput`] as one entry.

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Value};

use crate::sandbox::output::{CapturedOutput, OutputKind};
use crate::sandbox::serialize;

/// Global names the hooks are installed under, and the entry kind each
/// produces. The bootstrap script removes these names again.
pub const HOOKS: &[(&str, OutputKind)] = &[
    ("__sandbox_log", OutputKind::Log),
    ("__sandbox_error", OutputKind::Error),
    ("__sandbox_warn", OutputKind::Warn),
    ("__sandbox_info", OutputKind::Info),
];

/// Install all hooks on the context's global object.
pub fn install<'js>(ctx: &Ctx<'js>, output: &CapturedOutput) -> rquickjs::Result<()> {
    let globals = ctx.globals();
    for &(name, kind) in HOOKS {
        let sink = output.clone();
        let hook = Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
                sink.push(kind, format_args(&ctx, &args.0));
            },
        )?;
        globals.set(name, hook)?;
    }
    Ok(())
}

/// Render a variadic hook call as one line.
pub fn format_args<'js>(ctx: &Ctx<'js>, args: &[Value<'js>]) -> String {
    args.iter()
        .map(|arg| serialize::stringify(ctx, arg))
        .collect::<Vec<_>>()
        .join(" ")
}
