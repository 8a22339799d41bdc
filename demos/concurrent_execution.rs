//! Example of concurrent JavaScript execution through one sandbox.
//!
//! Every task gets its own arena; the sandbox only holds configuration and
//! the arena ledger.
//!
//! Run with: cargo run --example concurrent_execution

use js_sandbox_rs::prelude::*;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Concurrent Execution Example ===\n");

    let config = SandboxConfig::builder().max_concurrent(4).build();
    let sandbox = Arc::new(JsSandbox::new(config));

    // Define some tasks to run concurrently
    let tasks = vec![
        (
            "Task 1",
            "Array.from({length: 100}, (_, i) => i * i).reduce((a, b) => a + b)",
            "Sum of squares",
        ),
        (
            "Task 2",
            "Array.from({length: 1000}, (_, i) => i).filter(x => x % 3 === 0).length",
            "Count divisible by 3",
        ),
        (
            "Task 3",
            "Array.from({length: 50}, (_, i) => String.fromCharCode(65 + i % 26)).join('')",
            "Generate letters",
        ),
        (
            "Task 4",
            "Math.max(...Array.from({length: 101}, (_, i) => i * (100 - i)))",
            "Maximum product",
        ),
    ];

    println!("Starting {} concurrent tasks...\n", tasks.len());
    let start = Instant::now();

    // Spawn all tasks concurrently
    let mut handles = Vec::new();
    for (name, code, description) in tasks {
        let sandbox = Arc::clone(&sandbox);
        let handle = tokio::spawn(async move {
            let task_start = Instant::now();
            let result = sandbox.execute(code, 5_000).await?;
            Ok::<_, SandboxError>((
                name,
                description,
                result.result_text().unwrap_or("<no value>").to_string(),
                task_start.elapsed(),
            ))
        });
        handles.push(handle);
    }

    // Collect results
    println!("Results:");
    println!("{:-<60}", "");
    for handle in handles {
        match handle.await {
            Ok(Ok((name, description, output, duration))) => {
                println!(
                    "{}: {} {} (took {:?})",
                    name, description, output, duration
                );
            }
            Ok(Err(e)) => {
                println!("Task error: {}", e);
            }
            Err(e) => {
                println!("Join error: {}", e);
            }
        }
    }
    println!("{:-<60}", "");

    println!("\nTotal wall-clock time: {:?}", start.elapsed());
    println!("Arenas still allocated: {}", sandbox.ledger().live());

    Ok(())
}
