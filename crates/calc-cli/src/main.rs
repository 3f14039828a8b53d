//! calc - execute a JSON operation program and print its outputs.
//!
//! Reads a program (a JSON array of calc/print operations) from a file or
//! stdin, runs it through the concurrent execution engine, and writes the
//! print outputs as JSON to stdout. Ctrl-C cancels an in-flight execution.

use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use calc_engine::{Engine, EngineConfig};
use calc_program::{decode_program, encode_outputs, encode_outputs_pretty};

#[derive(Parser, Debug)]
#[command(name = "calc")]
#[command(about = "Executes a calc operation program concurrently")]
#[command(version)]
struct Args {
    /// Input program file ("-" reads from stdin)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Dependency resolve timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2000)]
    timeout_ms: u64,

    /// Request id for log correlation (generated when omitted)
    #[arg(long)]
    request_id: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn read_input(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read program from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let request_id = args
        .request_id
        .unwrap_or_else(|| ulid::Ulid::new().to_string());

    let data = read_input(&args.input)?;
    let program = decode_program(&data).context("invalid program")?;
    tracing::info!(request_id, operations = program.len(), "program decoded");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling execution");
                cancel.cancel();
            }
        });
    }

    let engine = Engine::new(
        EngineConfig::new().resolve_timeout(Duration::from_millis(args.timeout_ms)),
    );
    let outputs = engine.execute(&request_id, program, &cancel).await?;

    let encoded = if args.pretty {
        encode_outputs_pretty(&outputs)?
    } else {
        encode_outputs(&outputs)?
    };
    println!("{}", String::from_utf8_lossy(&encoded));

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Execution failed: {:#}", e);
        process::exit(1);
    }
}
