//! Rendering of JS values as output text.

use rquickjs::convert::Coerced;
use rquickjs::{Ctx, Function, Value};

use crate::sandbox::output::{OutputEntry, OutputKind};

/// Prefix of the completion value entry.
pub const RESULT_MARKER: &str = "=> ";

/// Render `value` the way console arguments and completion values are shown.
///
/// Objects and arrays are JSON-encoded; when that fails (cycles, a throwing
/// `toJSON`, or no JSON form at all) they fall back to string coercion, as
/// do all scalars.
pub fn stringify<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    if is_composite(value) {
        match ctx.json_stringify(value.clone()) {
            Ok(Some(json)) => {
                if let Ok(text) = json.to_string() {
                    return text;
                }
            }
            Ok(None) => {}
            Err(_) => {
                ctx.catch();
            }
        }
    }
    coerce_string(ctx, value)
}

/// `String(value)`, without letting a throwing conversion escape.
pub fn coerce_string<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    match value.get::<Coerced<String>>() {
        Ok(Coerced(text)) => return text,
        Err(_) => {
            ctx.catch();
        }
    }

    // ToString rejects symbols, String() does not.
    let via_global = ctx
        .globals()
        .get::<_, Function>("String")
        .and_then(|string| string.call::<_, String>((value.clone(),)));
    match via_global {
        Ok(text) => text,
        Err(_) => {
            ctx.catch();
            String::from("[unprintable value]")
        }
    }
}

/// Build the `result` entry for a completion value.
///
/// Returns `None` for `undefined`, which means the script produced no value.
pub fn completion_entry<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> Option<OutputEntry> {
    if value.is_undefined() {
        return None;
    }
    Some(OutputEntry::new(
        OutputKind::Result,
        format!("{}{}", RESULT_MARKER, stringify(ctx, value)),
    ))
}

fn is_composite(value: &Value<'_>) -> bool {
    (value.is_object() || value.is_array()) && !value.is_function()
}
