//! Example demonstrating the failure model.
//!
//! Code-originated faults never surface as `Err`; they come back as a
//! result with `success == false`:
//! - Thrown exceptions
//! - Syntax errors
//! - Timeouts
//! - Memory limits
//!
//! Run with: cargo run --example error_handling

use js_sandbox_rs::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Error Handling Example ===\n");

    let sandbox = JsSandbox::new(SandboxConfig::default());

    let cases = [
        ("Thrown TypeError", "null.property", 1_000),
        ("Syntax error", "function (", 1_000),
        ("Timeout", "while (true) {}", 200),
        (
            "Memory limit",
            "const hoard = []; while (true) hoard.push(new Array(1000000).fill(0));",
            10_000,
        ),
    ];

    for (label, code, timeout_ms) in cases {
        println!("--- {} ---", label);
        let result = sandbox.execute(code, timeout_ms).await?;

        if result.is_success() {
            println!("Unexpected success: {:?}", result.output);
        } else {
            println!("error field: {}", result.error.as_deref().unwrap_or(""));
            for entry in result.entries(OutputKind::Error) {
                println!("error entry: {}", entry.text);
            }
        }
        println!();
    }

    // Host faults are the only `Err` values
    println!("--- Host-level errors ---");
    let err = SandboxError::Bootstrap("console could not be installed".to_string());
    println!("setup failure: {} (is_setup_failure: {})", err, err.is_setup_failure());

    println!("\nArenas still allocated: {}", sandbox.ledger().live());

    Ok(())
}
