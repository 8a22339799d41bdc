//! Basic example of executing JavaScript code in the sandbox.
//!
//! Run with: cargo run --example basic_execution

use js_sandbox_rs::prelude::*;
use std::time::Duration;

fn print_result(result: &ExecutionResult) {
    for entry in &result.output {
        println!("[{}] {}", entry.kind, entry.text);
    }
    println!("success: {}", result.success);
    if let Some(error) = &result.error {
        println!("error: {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure the sandbox
    let config = SandboxConfig::builder()
        .default_timeout(Duration::from_secs(5))
        .build();

    println!("Creating sandbox with config: {:?}", config);
    let sandbox = JsSandbox::new(config);

    // Execute simple arithmetic
    println!("\n=== Test 1: Simple arithmetic ===");
    let result = sandbox.execute("console.log('hi'); 1 + 1", 5_000).await?;
    print_result(&result);

    // Execute with a loop
    println!("\n=== Test 2: Loop execution ===");
    let code = r#"
for (let i = 0; i < 5; i++) {
    console.log(`Count: ${i}`);
}
({ done: true, counted: 5 })
"#;
    let result = sandbox.execute(code, 5_000).await?;
    print_result(&result);

    // Test error handling
    println!("\n=== Test 3: Thrown error ===");
    let result = sandbox.execute("throw new Error('test error')", 5_000).await?;
    print_result(&result);

    Ok(())
}
