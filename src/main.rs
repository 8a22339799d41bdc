//! js-sandbox CLI - run JavaScript snippets in a bounded sandbox

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use js_sandbox_rs::service::{self, ExecutionRequest};
use js_sandbox_rs::{JsSandbox, SandboxConfig};

#[derive(Parser)]
#[command(name = "js-sandbox")]
#[command(
    author,
    version,
    about = "Run JavaScript snippets in a resource-bounded sandbox",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Timeout applied when a request carries none
    #[arg(long, global = true, env = "SANDBOX_DEFAULT_TIMEOUT_MS", default_value = "10000")]
    default_timeout_ms: u64,

    /// Upper bound for request timeouts
    #[arg(long, global = true, env = "SANDBOX_MAX_TIMEOUT_MS", default_value = "10000")]
    max_timeout_ms: u64,

    /// Maximum number of concurrent sessions (unbounded when unset)
    #[arg(long, global = true, env = "SANDBOX_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file (or stdin) and print the result as JSON
    Run {
        /// Script to run; reads stdin when omitted or "-"
        file: Option<PathBuf>,

        /// Wall-clock budget in milliseconds
        #[arg(long, short)]
        timeout_ms: Option<u64>,
    },

    /// Read a JSON request body from stdin and print status and body
    Handle,

    /// Print the liveness payload
    Health,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("js_sandbox_rs=info")),
        )
        .init();

    match run(Args::parse()).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let mut builder = SandboxConfig::builder()
        .default_timeout(Duration::from_millis(args.default_timeout_ms))
        .max_timeout(Duration::from_millis(args.max_timeout_ms));
    if let Some(sessions) = args.max_concurrent {
        builder = builder.max_concurrent(sessions);
    }
    let sandbox = JsSandbox::new(builder.build());

    match args.command {
        Command::Run { file, timeout_ms } => {
            let code = read_source(file.as_ref())?;
            let response = service::handle(&sandbox, ExecutionRequest::new(code, timeout_ms)).await;
            println!("{}", serde_json::to_string_pretty(&response.body)?);
            Ok(if response.body.success { 0 } else { 1 })
        }
        Command::Handle => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .context("failed to read request body from stdin")?;
            let response = service::handle_body(&sandbox, &body).await;
            let payload = serde_json::json!({
                "status": response.status.code(),
                "body": response.body,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(0)
        }
        Command::Health => {
            println!("{}", service::health());
            Ok(0)
        }
    }
}

fn read_source(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut code = String::new();
            std::io::stdin()
                .read_to_string(&mut code)
                .context("failed to read script from stdin")?;
            Ok(code)
        }
    }
}
